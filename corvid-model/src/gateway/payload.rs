//! Outgoing and incoming gateway payload bodies (the `d` field of a frame).

use super::intents::Intents;
use serde::{Deserialize, Serialize};

/// Client metadata sent with [`Identify`], identifying the library/OS to
/// the platform for diagnostics.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

impl IdentifyProperties {
    #[must_use]
    pub fn new(browser: &str, device: &str) -> Self {
        Self {
            os: std::env::consts::OS.to_owned(),
            browser: browser.to_owned(),
            device: device.to_owned(),
        }
    }
}

/// Body of an outgoing op 2 (Identify) frame.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Identify {
    pub token: String,
    pub intents: Intents,
    pub properties: IdentifyProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compress: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_threshold: Option<u64>,
    pub shard: [u64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence: Option<UpdatePresencePayload>,
}

/// Body of an outgoing op 6 (Resume) frame.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Resume {
    pub token: String,
    pub session_id: String,
    pub seq: u64,
}

/// Body of an incoming op 10 (Hello) frame.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Hello {
    pub heartbeat_interval: u64,
}

/// Body of an incoming op 9 (InvalidSession) frame: whether the session can
/// be resumed (`true`) or must re-Identify from scratch (`false`).
pub type InvalidSession = bool;

/// A client-initiated presence change.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct UpdatePresencePayload {
    pub status: String,
    #[serde(default)]
    pub afk: bool,
}
