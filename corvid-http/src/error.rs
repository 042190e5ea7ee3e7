use crate::api_error::ApiError;
use hyper::StatusCode;
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    result::Result as StdResult,
};

pub type Result<T, E = Error> = StdResult<T, E>;

/// An error encountered while building or executing a REST request.
#[derive(Debug)]
pub struct Error {
    source: Option<Box<dyn StdError + Send + Sync>>,
    kind: ErrorType,
}

impl Error {
    /// The type of error that occurred.
    #[must_use]
    pub fn kind(&self) -> &ErrorType {
        &self.kind
    }

    /// Consume the error, returning its source if there is one.
    #[must_use]
    pub fn into_source(self) -> Option<Box<dyn StdError + Send + Sync>> {
        self.source
    }

    pub(crate) fn new(kind: ErrorType, source: Option<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { kind, source }
    }

    pub(crate) fn json(source: serde_json::Error) -> Self {
        Self::new(ErrorType::Json, Some(Box::new(source)))
    }

    pub(crate) fn request(source: hyper::Error) -> Self {
        Self::new(ErrorType::RequestError, Some(Box::new(source)))
    }

    pub(crate) fn ratelimiting(source: corvid_http_ratelimiting::GenericError) -> Self {
        Self::new(ErrorType::Ratelimiting, Some(source))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ErrorType::BuildingRequest => f.write_str("failed to build the request"),
            ErrorType::Json => f.write_str("given value couldn't be serialized"),
            ErrorType::Parsing { body } => {
                write!(f, "response body couldn't be deserialized: {body:?}")
            }
            ErrorType::Ratelimiting => f.write_str("ratelimiter failure"),
            ErrorType::RequestError => f.write_str("sending or receiving the response failed"),
            ErrorType::Response { error, status, .. } => {
                write!(f, "response error: status {status}, error: {error}")
            }
            ErrorType::Unauthorized => {
                f.write_str("token in use is invalid, expired, or revoked")
            }
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

/// The kind of [`Error`] that occurred.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorType {
    /// The request could not be constructed.
    BuildingRequest,
    /// A value could not be serialized to JSON.
    Json,
    /// The response body could not be deserialized into the expected type.
    Parsing { body: Vec<u8> },
    /// The ratelimiter returned an error while waiting for or reporting a
    /// ticket.
    Ratelimiting,
    /// Sending the request or reading the response failed at the transport
    /// level.
    RequestError,
    /// The platform responded with a non-2xx status and a structured error
    /// body.
    Response {
        body: Vec<u8>,
        error: ApiError,
        status: StatusCode,
    },
    /// The configured token has been rejected; the client will not attempt
    /// further requests until reconfigured.
    Unauthorized,
}
