//! Timestamp parsing shared by every payload that carries an ISO 8601
//! datetime: message creation/edit, member join, and similar fields.

use serde::{
    de::{Deserialize, Deserializer, Error as DeError},
    Serialize, Serializer,
};
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// A UTC point in time, as sent by the platform in ISO 8601 form
/// (e.g. `"2021-08-10T12:34:00.000000+00:00"`).
///
/// Wraps [`OffsetDateTime`] rather than passing timestamps around as bare
/// strings: every payload field that carries a datetime round-trips
/// through this type, giving callers comparison, arithmetic, and a single
/// place that owns the wire format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Construct from a Unix timestamp in whole seconds.
    pub fn from_secs(unix_seconds: i64) -> Result<Self, TimestampParseError> {
        OffsetDateTime::from_unix_timestamp(unix_seconds)
            .map(Self)
            .map_err(TimestampParseError::range)
    }

    /// Construct from a Unix timestamp in whole microseconds.
    pub fn from_micros(unix_microseconds: i64) -> Result<Self, TimestampParseError> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(unix_microseconds) * 1_000)
            .map(Self)
            .map_err(TimestampParseError::range)
    }

    /// Seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Microseconds since the Unix epoch.
    #[must_use]
    pub fn as_micros(self) -> i64 {
        (self.0.unix_timestamp_nanos() / 1_000) as i64
    }
}

impl FromStr for Timestamp {
    type Err = TimestampParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        OffsetDateTime::parse(value, &Rfc3339)
            .map(Self)
            .map_err(TimestampParseError::format)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let formatted = self.0.format(&Rfc3339).map_err(|_| std::fmt::Error)?;

        f.write_str(&formatted)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <&str>::deserialize(deserializer).and_then(|raw| Self::from_str(raw).map_err(DeError::custom))
    }
}

/// An error parsing or constructing a [`Timestamp`].
#[derive(Debug)]
pub struct TimestampParseError {
    kind: TimestampParseErrorKind,
}

impl TimestampParseError {
    fn format(source: time::error::Parse) -> Self {
        Self {
            kind: TimestampParseErrorKind::Format(source),
        }
    }

    fn range(source: time::error::ComponentRange) -> Self {
        Self {
            kind: TimestampParseErrorKind::Range(source),
        }
    }
}

#[derive(Debug)]
enum TimestampParseErrorKind {
    Format(time::error::Parse),
    Range(time::error::ComponentRange),
}

impl Display for TimestampParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            TimestampParseErrorKind::Format(_) => f.write_str("timestamp is not valid RFC 3339"),
            TimestampParseErrorKind::Range(_) => f.write_str("timestamp value is out of range"),
        }
    }
}

impl StdError for TimestampParseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            TimestampParseErrorKind::Format(source) => Some(source),
            TimestampParseErrorKind::Range(source) => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Timestamp;
    use std::str::FromStr;

    #[test]
    fn parses_rfc3339_with_fractional_seconds() {
        let timestamp = Timestamp::from_str("2021-09-19T14:17:32.000000+00:00").unwrap();
        assert_eq!(timestamp.as_secs(), 1_632_067_052);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Timestamp::from_str("not a timestamp").is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        let timestamp = Timestamp::from_secs(1_632_067_052).unwrap();
        let rendered = timestamp.to_string();
        let reparsed = Timestamp::from_str(&rendered).unwrap();
        assert_eq!(timestamp, reparsed);
    }

    #[test]
    fn serializes_as_a_json_string() {
        let timestamp = Timestamp::from_secs(1_632_067_052).unwrap();
        let json = serde_json::to_string(&timestamp).unwrap();
        assert!(json.starts_with('"') && json.ends_with('"'));

        let decoded: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(timestamp, decoded);
    }
}
