//! Shape of the platform's structured JSON error body, returned alongside
//! non-2xx responses.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A structured API error body, e.g. `{"code": 50035, "message": "Invalid Form Body"}`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ApiError {
    pub code: u64,
    pub message: String,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "api error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
