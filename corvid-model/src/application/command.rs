//! Application command option tree: like [`super::component::Component`],
//! discriminated by a `type` integer and preserving unknown option types
//! verbatim.

use serde::{
    de::{Deserialize, Deserializer, Error as DeError},
    ser::{Serialize, Serializer},
};
use serde_json::Value;

/// A string-valued command option.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StringOption {
    pub name: String,
    pub value: String,
}

/// An integer-valued command option.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IntegerOption {
    pub name: String,
    pub value: i64,
}

/// A node of a slash-command's parsed option tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CommandOption {
    String(StringOption),
    Integer(IntegerOption),
    /// An option type this crate does not model, preserved verbatim.
    Unknown(Value),
}

impl CommandOption {
    const STRING: u64 = 3;
    const INTEGER: u64 = 4;
}

impl<'de> Deserialize<'de> for CommandOption {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;

        match value.get("type").and_then(Value::as_u64) {
            Some(Self::STRING) => serde_json::from_value(value)
                .map(CommandOption::String)
                .map_err(DeError::custom),
            Some(Self::INTEGER) => serde_json::from_value(value)
                .map(CommandOption::Integer)
                .map_err(DeError::custom),
            _ => Ok(CommandOption::Unknown(value)),
        }
    }
}

impl Serialize for CommandOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(option) => {
                let mut value = serde_json::to_value(option).map_err(serde::ser::Error::custom)?;
                value["type"] = Value::from(Self::STRING);
                value.serialize(serializer)
            }
            Self::Integer(option) => {
                let mut value = serde_json::to_value(option).map_err(serde::ser::Error::custom)?;
                value["type"] = Value::from(Self::INTEGER);
                value.serialize(serializer)
            }
            Self::Unknown(value) => value.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandOption, StringOption};

    #[test]
    fn known_option_round_trips() {
        let option = CommandOption::String(StringOption {
            name: "query".into(),
            value: "hello".into(),
        });

        let json = serde_json::to_string(&option).unwrap();
        let decoded: CommandOption = serde_json::from_str(&json).unwrap();
        assert_eq!(option, decoded);
    }

    #[test]
    fn unknown_option_preserved() {
        let original = r#"{"type":11,"name":"att","value":"123"}"#;
        let option: CommandOption = serde_json::from_str(original).unwrap();
        assert!(matches!(option, CommandOption::Unknown(_)));

        let remarshaled = serde_json::to_string(&option).unwrap();
        let a: serde_json::Value = serde_json::from_str(original).unwrap();
        let b: serde_json::Value = serde_json::from_str(&remarshaled).unwrap();
        assert_eq!(a, b);
    }
}
