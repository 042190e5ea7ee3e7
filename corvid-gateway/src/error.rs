//! Errors returned by shard and cluster operations.

use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    result::Result as StdResult,
};

/// A result enum with the error type being this crate's [`Error`] type.
pub type Result<T, E = Error> = StdResult<T, E>;

/// An error that occurred running a shard or cluster.
#[derive(Debug)]
pub struct Error {
    pub(crate) kind: ErrorType,
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub(crate) fn new(kind: ErrorType, source: Option<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { kind, source }
    }

    /// Immutable reference to the type of error that occurred.
    #[must_use = "retrieving the type has no effect if left unused"]
    pub const fn kind(&self) -> &ErrorType {
        &self.kind
    }

    /// Consume the error, returning the source error if there is any.
    #[must_use = "consuming the error and retrieving the source has no effect if left unused"]
    pub fn into_source(self) -> Option<Box<dyn StdError + Send + Sync>> {
        self.source
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ErrorType::Establishing => f.write_str("establishing the websocket connection failed"),
            ErrorType::Decompressing => {
                f.write_str("a frame could not be decompressed, it may be invalid")
            }
            ErrorType::Deserializing => f.write_str("payload is not a recognized gateway event"),
            ErrorType::Sending => f.write_str("sending a message over the websocket failed"),
            ErrorType::Serializing => f.write_str("serializing a payload as json failed"),
            ErrorType::FatallyClosed { close_code } => {
                write!(f, "shard fatally closed with code {close_code}")
            }
            ErrorType::GettingGatewayUrl => f.write_str("getting the gateway url via REST failed"),
            ErrorType::ParsingUrl { url } => write!(f, "the gateway url {url:?} is invalid"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| &**source as &(dyn StdError + 'static))
    }
}

/// Type of [`Error`] that occurred.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum ErrorType {
    /// Establishing the websocket connection failed.
    Establishing,
    /// Decompressing a frame failed.
    Decompressing,
    /// The received payload did not deserialize into a recognized gateway
    /// event.
    Deserializing,
    /// Sending a payload over the websocket failed; the shard is likely
    /// shutdown.
    Sending,
    /// Serializing a payload as JSON failed.
    Serializing,
    /// The shard was closed by the server with a fatal close code.
    FatallyClosed {
        /// Close code sent by the server, or `4000` if the connection
        /// dropped without a close frame.
        close_code: u16,
    },
    /// Retrieving the recommended gateway URL/shard count via REST failed.
    GettingGatewayUrl,
    /// The gateway URL built from the REST-advertised URL plus query
    /// parameters failed to parse.
    ParsingUrl {
        /// The URL that failed to parse.
        url: String,
    },
}

/// Close codes the server sends that require the shard to stop reconnecting
/// on its own and surface the failure upward.
///
/// `4011` (sharding required) is handled separately by the cluster, which
/// rescales rather than treating it as fatal to the bot as a whole.
#[must_use]
pub fn is_fatal_close_code(code: u16) -> bool {
    matches!(code, 4004 | 4010 | 4013 | 4014)
}

/// Whether a server close code means the session must re-Identify instead
/// of Resume.
#[must_use]
pub fn clears_session(code: u16) -> bool {
    matches!(code, 4007 | 4009)
}
