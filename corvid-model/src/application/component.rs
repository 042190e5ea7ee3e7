//! Message components: action rows, buttons and select menus form a tagged
//! tree discriminated by a `type` integer. Variants this crate doesn't
//! recognize are preserved verbatim as [`Component::Unknown`] so that a
//! round trip through an unknown future component type never loses data.

use serde::{
    de::{Deserialize, Deserializer, Error as DeError},
    ser::{Serialize, Serializer},
};
use serde_json::Value;

/// A row of interactive components attached to a message.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionRow {
    pub components: Vec<Component>,
}

/// A clickable button component.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Button {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub style: u8,
    #[serde(default)]
    pub disabled: bool,
}

/// A single node of the message-component tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Component {
    ActionRow(ActionRow),
    Button(Button),
    /// A component type this crate does not model. The original JSON is
    /// kept verbatim so re-serializing it is lossless.
    Unknown(Value),
}

impl Component {
    const ACTION_ROW: u64 = 1;
    const BUTTON: u64 = 2;

    fn type_of(value: &Value) -> Option<u64> {
        value.get("type").and_then(Value::as_u64)
    }
}

impl<'de> Deserialize<'de> for Component {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;

        match Self::type_of(&value) {
            Some(Self::ACTION_ROW) => serde_json::from_value(value)
                .map(Component::ActionRow)
                .map_err(DeError::custom),
            Some(Self::BUTTON) => serde_json::from_value(value)
                .map(Component::Button)
                .map_err(DeError::custom),
            _ => Ok(Component::Unknown(value)),
        }
    }
}

impl Serialize for Component {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::ActionRow(row) => {
                let mut value = serde_json::to_value(row).map_err(serde::ser::Error::custom)?;
                value["type"] = Value::from(Self::ACTION_ROW);
                value.serialize(serializer)
            }
            Self::Button(button) => {
                let mut value = serde_json::to_value(button).map_err(serde::ser::Error::custom)?;
                value["type"] = Value::from(Self::BUTTON);
                value.serialize(serializer)
            }
            Self::Unknown(value) => value.serialize(serializer),
        }
    }
}
