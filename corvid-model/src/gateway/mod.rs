pub mod event;
pub mod intents;
pub mod opcode;
pub mod payload;

pub use event::{DispatchEvent, GatewayEvent};
pub use intents::Intents;
pub use opcode::OpCode;

use serde::{Deserialize, Serialize};

/// Response body of `GET /gateway/bot`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GatewayInfo {
    pub shards: u64,
    pub session_start_limit: SessionStartLimit,
}

/// The `session_start_limit` object nested in [`GatewayInfo`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SessionStartLimit {
    pub total: u64,
    pub remaining: u64,
    pub reset_after: u64,
    pub max_concurrency: u64,
}
