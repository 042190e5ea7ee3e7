//! Typed parsing of the platform's `X-RateLimit-*` response headers.

use http::HeaderMap;
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// A header was missing or failed to parse as its expected type.
#[derive(Debug)]
pub struct HeaderParsingError {
    pub name: &'static str,
}

impl Display for HeaderParsingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "header '{}' is missing or malformed", self.name)
    }
}

impl std::error::Error for HeaderParsingError {}

/// Decoded ratelimit information carried by a response.
#[derive(Clone, Debug, PartialEq)]
pub enum RatelimitHeaders {
    /// No ratelimit headers were present; the route isn't bucketed.
    None,
    /// Bucket state is present; this is the common case.
    Present(Present),
    /// A 429 response indicating a global (bot-wide) ratelimit.
    GlobalLimited {
        /// Seconds to wait before retrying.
        retry_after: f64,
    },
}

/// Parsed `X-RateLimit-*` headers from a non-global response.
#[derive(Clone, Debug, PartialEq)]
pub struct Present {
    pub bucket: Option<String>,
    pub limit: u64,
    pub remaining: u64,
    pub reset_after: f64,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn header_parsed<T: FromStr>(headers: &HeaderMap, name: &'static str) -> Result<T, HeaderParsingError> {
    header_str(headers, name)
        .and_then(|value| value.parse().ok())
        .ok_or(HeaderParsingError { name })
}

impl RatelimitHeaders {
    /// Parse the ratelimit headers out of a response, classifying a 429
    /// with `global: true` (carried via the `x-ratelimit-global` header) as
    /// [`Self::GlobalLimited`].
    ///
    /// # Errors
    ///
    /// Returns [`HeaderParsingError`] if the bucket headers are present but
    /// malformed.
    pub fn from_headers(
        headers: &HeaderMap,
        is_429: bool,
    ) -> Result<Self, HeaderParsingError> {
        if is_429 && headers.get("x-ratelimit-global").is_some() {
            let retry_after = header_parsed(headers, "retry-after")?;
            return Ok(Self::GlobalLimited { retry_after });
        }

        if headers.get("x-ratelimit-limit").is_none() {
            return Ok(Self::None);
        }

        Ok(Self::Present(Present {
            bucket: header_str(headers, "x-ratelimit-bucket").map(str::to_owned),
            limit: header_parsed(headers, "x-ratelimit-limit")?,
            remaining: header_parsed(headers, "x-ratelimit-remaining")?,
            reset_after: header_parsed(headers, "x-ratelimit-reset-after")?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::RatelimitHeaders;
    use http::HeaderMap;

    #[test]
    fn parses_present_bucket() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-bucket", "abcd".parse().unwrap());
        headers.insert("x-ratelimit-limit", "5".parse().unwrap());
        headers.insert("x-ratelimit-remaining", "4".parse().unwrap());
        headers.insert("x-ratelimit-reset-after", "1.5".parse().unwrap());

        let parsed = RatelimitHeaders::from_headers(&headers, false).unwrap();
        match parsed {
            RatelimitHeaders::Present(present) => {
                assert_eq!(present.bucket.as_deref(), Some("abcd"));
                assert_eq!(present.limit, 5);
                assert_eq!(present.remaining, 4);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn classifies_global_429() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-global", "true".parse().unwrap());
        headers.insert("retry-after", "2.5".parse().unwrap());

        let parsed = RatelimitHeaders::from_headers(&headers, true).unwrap();
        assert_eq!(parsed, RatelimitHeaders::GlobalLimited { retry_after: 2.5 });
    }

    #[test]
    fn absent_headers_yield_none() {
        let headers = HeaderMap::new();
        assert_eq!(
            RatelimitHeaders::from_headers(&headers, false).unwrap(),
            RatelimitHeaders::None
        );
    }
}
