//! A typed REST client for the platform's HTTP API, sitting on top of the
//! ratelimiting crate's bucket bookkeeping.
//!
//! Endpoint coverage is intentionally narrow: enough request shapes to
//! exercise every route-canonicalization rule and to drive a shard manager's
//! need for `/gateway/bot` (see [`client::request`]).

pub mod api_error;
pub mod client;
pub mod error;
pub mod routing;

pub use crate::{client::Client, error::Error};

/// API version this crate targets.
pub const API_VERSION: u8 = 10;
