//! Time-sortable, domain-typed identifiers.
//!
//! An [`Id`] wraps a 64-bit integer carrying `(ms-since-epoch << 22) | worker
//! << 17 | pid << 12 | increment`. The value `0` means "absent"; the value
//! `u64::MAX` is an explicit null sentinel distinct from absence. [`Id`] is
//! generic over a zero-sized [`marker::Marker`] so that, for example, a
//! [`GuildMarker`][marker::GuildMarker] id can never be passed where a
//! [`ChannelMarker`][marker::ChannelMarker] id is expected.

pub mod marker;

use marker::Marker;
use serde::{
    de::{Deserialize, Deserializer, Error as DeError, Visitor},
    ser::{Serialize, Serializer},
};
use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display, Formatter},
    hash::{Hash, Hasher},
    marker::PhantomData,
    str::FromStr,
};

/// Milliseconds since the platform epoch at which the value `0` would roll
/// over; used purely to keep timestamp math centralized.
pub const PLATFORM_EPOCH: u64 = 1_420_070_400_000;

/// Sentinel carried by an explicit JSON `null`, as distinct from an absent
/// field (which callers represent with `Option<Id<T>>`).
pub const NULL: u64 = u64::MAX;

/// Number of bits reserved below the timestamp for worker/process/increment.
const TIMESTAMP_SHIFT: u64 = 22;

/// A 64-bit identifier scoped to a particular domain via `T`.
pub struct Id<T> {
    value: u64,
    phantom: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// Create an id from a raw value, performing no validation.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self {
            value,
            phantom: PhantomData,
        }
    }

    /// The explicit-null sentinel for this marker.
    #[must_use]
    pub const fn null() -> Self {
        Self::new(NULL)
    }

    /// Construct an id from a millisecond timestamp and the lower 22 bits of
    /// worker/process/increment data.
    #[must_use]
    pub const fn new_from_time(timestamp_ms: u64, lower: u64) -> Self {
        Self::new((timestamp_ms << TIMESTAMP_SHIFT) | (lower & ((1 << TIMESTAMP_SHIFT) - 1)))
    }

    /// The raw integer value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.value
    }

    /// Whether this id is neither absent (`0`) nor the explicit null
    /// sentinel.
    #[must_use]
    pub const fn valid(self) -> bool {
        self.value != 0 && self.value != NULL
    }

    /// Milliseconds-since-epoch embedded in the id, truncated to whatever
    /// precision [`Self::new_from_time`] was called with.
    ///
    /// Meaningless for `0` or the null sentinel; callers should check
    /// [`Self::valid`] first if that distinction matters.
    #[must_use]
    pub const fn timestamp(self) -> u64 {
        self.value >> TIMESTAMP_SHIFT
    }

    /// Cast to a differently-marked id without changing the underlying
    /// value. Used internally when a field is known by construction to share
    /// representation with another marker (e.g. reading a channel id out of
    /// a generic snowflake field).
    #[must_use]
    pub const fn cast<U>(self) -> Id<U> {
        Id::new(self.value)
    }
}

impl<T: Marker> Id<T> {
    /// Render the mention form of this id, e.g. `<@123>` for a user.
    ///
    /// Returns `None` for markers with no mention syntax (e.g. attachments).
    #[must_use]
    pub fn mention(self) -> Option<String> {
        Marker::MENTION_PREFIX.map(|prefix| format!("<{}{}>", prefix, self.value))
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Id").field(&self.value).finish()
    }
}

impl<T> Display for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.value == NULL {
            f.write_str("null")
        } else {
            Display::fmt(&self.value, f)
        }
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T> From<u64> for Id<T> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

/// Error returned when a string does not parse as a decimal integer or the
/// literal `"null"`.
#[derive(Debug)]
pub struct IdParseError(std::num::ParseIntError);

impl Display for IdParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for IdParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl<T> FromStr for Id<T> {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "null" {
            return Ok(Self::null());
        }

        s.parse().map(Self::new).map_err(IdParseError)
    }
}

struct IdVisitor<T> {
    phantom: PhantomData<fn() -> T>,
}

impl<'de, T> Visitor<'de> for IdVisitor<T> {
    type Value = Id<T>;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal integer, a decimal string, or \"null\"")
    }

    fn visit_u64<E: DeError>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Id::new(value))
    }

    fn visit_i64<E: DeError>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Id::new(value as u64))
    }

    fn visit_none<E: DeError>(self) -> Result<Self::Value, E> {
        Ok(Id::null())
    }

    fn visit_unit<E: DeError>(self) -> Result<Self::Value, E> {
        Ok(Id::null())
    }

    fn visit_str<E: DeError>(self, value: &str) -> Result<Self::Value, E> {
        value.parse().map_err(DeError::custom)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdVisitor {
            phantom: PhantomData,
        })
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.value == NULL {
            serializer.serialize_none()
        } else {
            serializer.collect_str(&self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{marker::UserMarker, Id, NULL};

    type UserId = Id<UserMarker>;

    #[test]
    fn round_trip_timestamp() {
        let id = UserId::new_from_time(1_700_000_000_000, 42);
        assert_eq!(id.timestamp(), 1_700_000_000_000);
    }

    #[test]
    fn valid_excludes_sentinels() {
        assert!(!UserId::new(0).valid());
        assert!(!UserId::null().valid());
        assert!(UserId::new(123).valid());
    }

    #[test]
    fn json_null_sentinel_round_trips() {
        let id: UserId = serde_json::from_str("null").unwrap();
        assert_eq!(id, UserId::null());
        assert_eq!(serde_json::to_string(&id).unwrap(), "null");

        let zero: UserId = serde_json::from_str("\"0\"").unwrap();
        assert_eq!(zero, UserId::new(0));
        assert_ne!(zero, UserId::null());
    }

    #[test]
    fn string_and_literal_null_parse_equal() {
        let a: UserId = serde_json::from_str("\"null\"").unwrap();
        let b: UserId = serde_json::from_str("null").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mention_uses_marker_prefix() {
        let id = UserId::new(123);
        assert_eq!(id.mention().as_deref(), Some("<@123>"));
    }

    #[test]
    fn decimal_string_round_trips() {
        let id: UserId = serde_json::from_str("\"123456\"").unwrap();
        assert_eq!(id.get(), 123_456);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"123456\"");
    }

    const _: fn() = || {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<UserId>();
    };

    #[allow(dead_code)]
    const fn sentinel_is_max() {
        assert!(NULL == u64::MAX);
    }
}
