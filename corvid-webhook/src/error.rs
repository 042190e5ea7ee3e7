use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    result::Result as StdResult,
};

pub type Result<T, E = Error> = StdResult<T, E>;

/// An error encountered while verifying or answering an interaction webhook
/// request.
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

    pub(crate) fn signature_encoding(source: hex::FromHexError) -> Self {
        Self::new(ErrorType::SignatureEncoding, Some(Box::new(source)))
    }

    pub(crate) fn signature_length(len: usize) -> Self {
        Self::new(ErrorType::SignatureLength { len }, None)
    }

    pub(crate) fn verification() -> Self {
        Self::new(ErrorType::Verification, None)
    }

    pub(crate) fn body(source: serde_json::Error) -> Self {
        Self::new(ErrorType::Body, Some(Box::new(source)))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ErrorType::SignatureEncoding => f.write_str("signature header is not valid hex"),
            ErrorType::SignatureLength { len } => {
                write!(f, "signature is {len} bytes, expected 64")
            }
            ErrorType::Verification => f.write_str("signature does not match the request body"),
            ErrorType::Body => f.write_str("request body could not be deserialized"),
            ErrorType::InvalidPublicKey => f.write_str("public key bytes are not a valid point"),
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
    /// The signature header was not valid hexadecimal.
    SignatureEncoding,
    /// The decoded signature was not 64 bytes long.
    SignatureLength { len: usize },
    /// The signature did not verify against the request body.
    Verification,
    /// The request body was not a valid interaction payload.
    Body,
    /// The configured public key bytes do not decode to a valid curve
    /// point.
    InvalidPublicKey,
}
