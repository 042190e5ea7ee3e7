use super::{command::CommandOption, component::Component};
use crate::{channel::embed::Embed, ApplicationId, ChannelId, GuildId, InteractionId, UserId};
use serde::{
    de::{Deserialize, Deserializer, Error as DeError},
    ser::{Serialize, Serializer},
};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Discriminant of an [`Interaction`]'s kind.
#[derive(Clone, Copy, Debug, Deserialize_repr, Eq, PartialEq, Serialize_repr)]
#[repr(u8)]
pub enum InteractionType {
    Ping = 1,
    ApplicationCommand = 2,
    MessageComponent = 3,
    ApplicationCommandAutocomplete = 4,
    ModalSubmit = 5,
}

/// Parsed data payload of an application-command interaction.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ApplicationCommandData {
    pub id: InteractionId,
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

/// The interaction-type-specific payload.
///
/// A `Ping` interaction carries no data; everything this crate doesn't
/// recognize is preserved as [`InteractionData::Unknown`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InteractionData {
    None,
    ApplicationCommand(ApplicationCommandData),
    Unknown(serde_json::Value),
}

impl<'de> Deserialize<'de> for InteractionData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;

        if value.is_null() {
            return Ok(Self::None);
        }

        if value.get("options").is_some() || value.get("name").is_some() {
            if let Ok(data) = serde_json::from_value::<ApplicationCommandData>(value.clone()) {
                return Ok(Self::ApplicationCommand(data));
            }
        }

        Ok(Self::Unknown(value))
    }
}

impl Serialize for InteractionData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_none(),
            Self::ApplicationCommand(data) => data.serialize(serializer),
            Self::Unknown(value) => value.serialize(serializer),
        }
    }
}

/// An interaction delivered either over the gateway (as a `Dispatch`) or via
/// the interaction webhook receiver (component I); the two surfaces yield
/// structurally identical values.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub application_id: ApplicationId,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<GuildId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_user_id: Option<UserId>,
    pub token: String,
    pub version: u8,
}

/// Message content sent along with an [`InteractionResponse`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct InteractionResponseData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
}

/// The payload returned to Discord for a received [`Interaction`].
///
/// `Pong` is the only valid response to a `Ping`; everything else answers an
/// application command, message component, or autocomplete interaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InteractionResponse {
    /// Acknowledges a `Ping` interaction.
    Pong,
    /// Acknowledges the interaction without sending a message yet; a
    /// followup message can still be sent later.
    DeferredChannelMessageWithSource,
    /// Responds immediately with a message.
    ChannelMessageWithSource(InteractionResponseData),
}

impl InteractionResponse {
    fn kind(&self) -> InteractionResponseType {
        match self {
            Self::Pong => InteractionResponseType::Pong,
            Self::DeferredChannelMessageWithSource => {
                InteractionResponseType::DeferredChannelMessageWithSource
            }
            Self::ChannelMessageWithSource(_) => InteractionResponseType::ChannelMessageWithSource,
        }
    }

    fn data(&self) -> Option<&InteractionResponseData> {
        match self {
            Self::Pong | Self::DeferredChannelMessageWithSource => None,
            Self::ChannelMessageWithSource(data) => Some(data),
        }
    }
}

impl Serialize for InteractionResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        InteractionResponseEnvelope {
            kind: self.kind(),
            data: self.data(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InteractionResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let envelope = InteractionResponseEnvelope::<Option<InteractionResponseData>>::deserialize(
            deserializer,
        )?;

        match envelope.kind {
            InteractionResponseType::Pong => Ok(Self::Pong),
            InteractionResponseType::DeferredChannelMessageWithSource => {
                Ok(Self::DeferredChannelMessageWithSource)
            }
            InteractionResponseType::ChannelMessageWithSource => {
                let data = envelope.data.ok_or_else(|| {
                    DeError::missing_field("data")
                })?;
                Ok(Self::ChannelMessageWithSource(data))
            }
        }
    }
}

#[derive(Deserialize, Serialize)]
struct InteractionResponseEnvelope<D> {
    #[serde(rename = "type")]
    kind: InteractionResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: D,
}

/// Discriminant of an [`InteractionResponse`]'s kind.
#[derive(Clone, Copy, Debug, Deserialize_repr, Eq, PartialEq, Serialize_repr)]
#[repr(u8)]
enum InteractionResponseType {
    Pong = 1,
    ChannelMessageWithSource = 4,
    DeferredChannelMessageWithSource = 5,
}

#[cfg(test)]
mod tests {
    use super::{ApplicationCommandData, Interaction, InteractionData, InteractionType};
    use crate::{
        application::command::{CommandOption, StringOption},
        ApplicationId, InteractionId,
    };

    #[test]
    fn ping_round_trips_without_data() {
        let interaction = Interaction {
            id: InteractionId::new(1),
            application_id: ApplicationId::new(2),
            kind: InteractionType::Ping,
            data: None,
            guild_id: None,
            channel_id: None,
            member_user_id: None,
            token: "t".into(),
            version: 1,
        };

        let json = serde_json::to_string(&interaction).unwrap();
        let decoded: Interaction = serde_json::from_str(&json).unwrap();
        assert_eq!(interaction, decoded);
    }

    #[test]
    fn application_command_data_round_trips() {
        let interaction = Interaction {
            id: InteractionId::new(1),
            application_id: ApplicationId::new(2),
            kind: InteractionType::ApplicationCommand,
            data: Some(InteractionData::ApplicationCommand(ApplicationCommandData {
                id: InteractionId::new(3),
                name: "ping".into(),
                options: vec![CommandOption::String(StringOption {
                    name: "arg".into(),
                    value: "v".into(),
                })],
            })),
            guild_id: None,
            channel_id: None,
            member_user_id: None,
            token: "t".into(),
            version: 1,
        };

        let json = serde_json::to_string(&interaction).unwrap();
        let decoded: Interaction = serde_json::from_str(&json).unwrap();
        assert_eq!(interaction, decoded);
    }

    #[test]
    fn pong_serializes_without_a_data_field() {
        let json = serde_json::to_string(&InteractionResponse::Pong).unwrap();
        assert_eq!(json, r#"{"type":1}"#);
    }

    #[test]
    fn channel_message_round_trips_with_its_data() {
        let response = InteractionResponse::ChannelMessageWithSource(InteractionResponseData {
            tts: None,
            content: Some("pong".into()),
            embeds: Vec::new(),
            components: Vec::new(),
        });

        let json = serde_json::to_string(&response).unwrap();
        let decoded: InteractionResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(response, decoded);
    }

    #[test]
    fn deferred_response_round_trips_without_data() {
        let response = InteractionResponse::DeferredChannelMessageWithSource;

        let json = serde_json::to_string(&response).unwrap();
        let decoded: InteractionResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(response, decoded);
    }
}
