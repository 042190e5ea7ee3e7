//! A three-state wrapper distinguishing "field absent from the payload"
//! from "field present and explicitly `null`", needed for partial update
//! payloads (member nick, message edited timestamp, channel parent id).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire state of an optionally-nullable field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Nullable<T> {
    /// The field was not present in the payload at all.
    Absent,
    /// The field was present and explicitly `null`.
    Null,
    /// The field was present with a value.
    Value(T),
}

impl<T> Nullable<T> {
    /// Collapse `Null` and `Absent` into `None`, matching `Option`'s
    /// semantics for callers that don't need the three-way distinction.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Null | Self::Absent => None,
        }
    }

    /// Whether the field was omitted from the payload entirely.
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Apply this wrapper to an existing `Option<T>` under merge semantics:
    /// `Absent` preserves the prior value, `Null` clears it, `Value`
    /// overwrites it.
    pub fn merge_into(self, existing: &mut Option<T>) {
        match self {
            Self::Absent => {}
            Self::Null => *existing = None,
            Self::Value(value) => *existing = Some(value),
        }
    }
}

impl<T> Default for Nullable<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Only invoked when the field is actually present in the payload;
        // callers pair this with `#[serde(default)]` so a missing field
        // never reaches here and keeps the `Absent` default.
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Self::Value(value),
            None => Self::Null,
        })
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::Null | Self::Absent => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Nullable;

    #[derive(serde::Deserialize, serde::Serialize)]
    struct Payload {
        #[serde(default, skip_serializing_if = "Nullable::is_absent")]
        parent_id: Nullable<u64>,
    }

    #[test]
    fn absent_field_stays_absent() {
        let payload: Payload = serde_json::from_str("{}").unwrap();
        assert!(matches!(payload.parent_id, Nullable::Absent));
    }

    #[test]
    fn explicit_null_is_distinct_from_absent() {
        let payload: Payload = serde_json::from_str(r#"{"parent_id":null}"#).unwrap();
        assert!(matches!(payload.parent_id, Nullable::Null));
    }

    #[test]
    fn present_value_round_trips() {
        let payload: Payload = serde_json::from_str(r#"{"parent_id":5}"#).unwrap();
        assert!(matches!(payload.parent_id, Nullable::Value(5)));

        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"parent_id":5}"#);
    }

    #[test]
    fn merge_into_respects_three_states() {
        let mut existing = Some(1u64);
        Nullable::Absent.merge_into(&mut existing);
        assert_eq!(existing, Some(1));

        Nullable::Null.merge_into(&mut existing);
        assert_eq!(existing, None);

        Nullable::Value(9).merge_into(&mut existing);
        assert_eq!(existing, Some(9));
    }
}
