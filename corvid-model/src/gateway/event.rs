//! Gateway dispatch payloads are a tagged union over the `t` field of the
//! wire envelope `{op, d, s, t}`. [`GatewayEvent`] decodes the envelope and,
//! for dispatches, looks `t` up to decode `d` into a [`DispatchEvent`]
//! variant; an event type this crate doesn't recognize becomes
//! [`DispatchEvent::Unknown`] rather than failing the whole frame.

use super::payload::Hello;
use crate::{
    channel::{Channel, Message},
    guild::{Emoji, Member, Presence, Role, VoiceState},
    nullable::Nullable,
    user::User,
    ChannelId, EmojiId, GuildId, MessageId, RoleId, Timestamp, UserId,
};
use serde::{
    de::{Deserialize, Deserializer, Error as DeError},
    Serialize,
};
use serde_json::Value;

/// Raw `{op, d, s, t}` wire envelope, decoded before dispatch lookup.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    op: u8,
    #[serde(default = "Value::default")]
    d: Value,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

/// A guild sent on `Ready` that the platform hasn't finished hydrating yet.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct UnavailableGuild {
    pub id: GuildId,
    #[serde(default)]
    pub unavailable: bool,
}

/// Body of the `Ready` dispatch: the first event on a fresh session.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Ready {
    pub session_id: String,
    pub user: User,
    #[serde(default)]
    pub guilds: Vec<UnavailableGuild>,
}

/// Body of `GuildDelete`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GuildDelete {
    pub id: GuildId,
    #[serde(default)]
    pub unavailable: bool,
}

/// Body of `MessageUpdate`: every field but the identifiers is optional,
/// since the platform omits whatever wasn't edited.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MessageUpdate {
    pub id: MessageId,
    pub channel_id: ChannelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub edited_timestamp: Nullable<Timestamp>,
}

/// Body of `MessageDelete`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MessageDelete {
    pub id: MessageId,
    pub channel_id: ChannelId,
}

/// Body of `MessageDeleteBulk`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MessageDeleteBulk {
    pub ids: Vec<MessageId>,
    pub channel_id: ChannelId,
}

/// The emoji identifying a reaction event; shared by the four reaction
/// dispatch variants.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ReactionEventEmoji {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EmojiId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body of `MessageReactionAdd`/`MessageReactionRemove`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MessageReaction {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub emoji: ReactionEventEmoji,
}

/// Body of `MessageReactionRemoveAll`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MessageReactionRemoveAll {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
}

/// Body of `MessageReactionRemoveEmoji`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MessageReactionRemoveEmoji {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub emoji: ReactionEventEmoji,
}

/// Body of `GuildMemberUpdate`: a partial [`Member`].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MemberUpdate {
    pub guild_id: GuildId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub nick: Nullable<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<RoleId>>,
}

/// Body of `GuildMemberRemove`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GuildMemberRemove {
    pub guild_id: GuildId,
    pub user_id: UserId,
}

/// Body of `GuildRoleCreate`/`GuildRoleUpdate`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GuildRoleEvent {
    pub guild_id: GuildId,
    pub role: Role,
}

/// Body of `GuildRoleDelete`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GuildRoleDelete {
    pub guild_id: GuildId,
    pub role_id: RoleId,
}

/// Body of `GuildEmojisUpdate`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GuildEmojisUpdate {
    pub guild_id: GuildId,
    pub emojis: Vec<Emoji>,
}

/// Body of `GuildMemberAdd`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MemberAdd {
    pub guild_id: GuildId,
    #[serde(flatten)]
    pub member: Member,
}

/// Body of `PresenceUpdate`.
pub type PresenceUpdateEvent = Presence;

/// Body of `VoiceStateUpdate`.
pub type VoiceStateUpdateEvent = VoiceState;

/// One decoded dispatch payload, keyed by the wire `t` string.
#[derive(Clone, Debug)]
pub enum DispatchEvent {
    Ready(Box<Ready>),
    Resumed,
    GuildCreate(Box<crate::guild::Guild>),
    GuildUpdate(Box<crate::guild::Guild>),
    GuildDelete(GuildDelete),
    ChannelCreate(Box<Channel>),
    ChannelUpdate(Box<Channel>),
    ChannelDelete(Box<Channel>),
    MessageCreate(Box<Message>),
    MessageUpdate(Box<MessageUpdate>),
    MessageDelete(MessageDelete),
    MessageDeleteBulk(MessageDeleteBulk),
    MessageReactionAdd(Box<MessageReaction>),
    MessageReactionRemove(Box<MessageReaction>),
    MessageReactionRemoveAll(MessageReactionRemoveAll),
    MessageReactionRemoveEmoji(MessageReactionRemoveEmoji),
    GuildMemberAdd(Box<MemberAdd>),
    GuildMemberUpdate(Box<MemberUpdate>),
    GuildMemberRemove(GuildMemberRemove),
    GuildRoleCreate(GuildRoleEvent),
    GuildRoleUpdate(GuildRoleEvent),
    GuildRoleDelete(GuildRoleDelete),
    PresenceUpdate(Box<PresenceUpdateEvent>),
    VoiceStateUpdate(Box<VoiceStateUpdateEvent>),
    GuildEmojisUpdate(GuildEmojisUpdate),
    /// A dispatch type this crate doesn't model, keyed by its wire `t`
    /// string with the raw `d` value preserved.
    Unknown { kind: String, value: Value },
}

impl DispatchEvent {
    fn from_parts(kind: &str, data: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            "READY" => Self::Ready(Box::new(serde_json::from_value(data)?)),
            "RESUMED" => Self::Resumed,
            "GUILD_CREATE" => Self::GuildCreate(Box::new(serde_json::from_value(data)?)),
            "GUILD_UPDATE" => Self::GuildUpdate(Box::new(serde_json::from_value(data)?)),
            "GUILD_DELETE" => Self::GuildDelete(serde_json::from_value(data)?),
            "CHANNEL_CREATE" => Self::ChannelCreate(Box::new(serde_json::from_value(data)?)),
            "CHANNEL_UPDATE" => Self::ChannelUpdate(Box::new(serde_json::from_value(data)?)),
            "CHANNEL_DELETE" => Self::ChannelDelete(Box::new(serde_json::from_value(data)?)),
            "MESSAGE_CREATE" => Self::MessageCreate(Box::new(serde_json::from_value(data)?)),
            "MESSAGE_UPDATE" => Self::MessageUpdate(Box::new(serde_json::from_value(data)?)),
            "MESSAGE_DELETE" => Self::MessageDelete(serde_json::from_value(data)?),
            "MESSAGE_DELETE_BULK" => Self::MessageDeleteBulk(serde_json::from_value(data)?),
            "MESSAGE_REACTION_ADD" => {
                Self::MessageReactionAdd(Box::new(serde_json::from_value(data)?))
            }
            "MESSAGE_REACTION_REMOVE" => {
                Self::MessageReactionRemove(Box::new(serde_json::from_value(data)?))
            }
            "MESSAGE_REACTION_REMOVE_ALL" => {
                Self::MessageReactionRemoveAll(serde_json::from_value(data)?)
            }
            "MESSAGE_REACTION_REMOVE_EMOJI" => {
                Self::MessageReactionRemoveEmoji(serde_json::from_value(data)?)
            }
            "GUILD_MEMBER_ADD" => Self::GuildMemberAdd(Box::new(serde_json::from_value(data)?)),
            "GUILD_MEMBER_UPDATE" => {
                Self::GuildMemberUpdate(Box::new(serde_json::from_value(data)?))
            }
            "GUILD_MEMBER_REMOVE" => Self::GuildMemberRemove(serde_json::from_value(data)?),
            "GUILD_ROLE_CREATE" => Self::GuildRoleCreate(serde_json::from_value(data)?),
            "GUILD_ROLE_UPDATE" => Self::GuildRoleUpdate(serde_json::from_value(data)?),
            "GUILD_ROLE_DELETE" => Self::GuildRoleDelete(serde_json::from_value(data)?),
            "PRESENCE_UPDATE" => Self::PresenceUpdate(Box::new(serde_json::from_value(data)?)),
            "VOICE_STATE_UPDATE" => {
                Self::VoiceStateUpdate(Box::new(serde_json::from_value(data)?))
            }
            "GUILD_EMOJIS_UPDATE" => Self::GuildEmojisUpdate(serde_json::from_value(data)?),
            other => Self::Unknown {
                kind: other.to_owned(),
                value: data,
            },
        })
    }
}

/// A decoded frame from the gateway socket.
#[derive(Clone, Debug)]
pub enum GatewayEvent {
    Dispatch(u64, DispatchEvent),
    Heartbeat(Option<u64>),
    Reconnect,
    InvalidSession(bool),
    Hello(Hello),
    HeartbeatAck,
}

impl<'de> Deserialize<'de> for GatewayEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnvelope::deserialize(deserializer)?;

        match raw.op {
            0 => {
                let kind = raw
                    .t
                    .ok_or_else(|| DeError::custom("dispatch frame missing `t`"))?;
                let seq = raw
                    .s
                    .ok_or_else(|| DeError::custom("dispatch frame missing `s`"))?;
                let event = DispatchEvent::from_parts(&kind, raw.d).map_err(DeError::custom)?;
                Ok(Self::Dispatch(seq, event))
            }
            1 => Ok(Self::Heartbeat(serde_json::from_value(raw.d).ok())),
            7 => Ok(Self::Reconnect),
            9 => Ok(Self::InvalidSession(
                serde_json::from_value(raw.d).unwrap_or(false),
            )),
            10 => Ok(Self::Hello(
                serde_json::from_value(raw.d).map_err(DeError::custom)?,
            )),
            11 => Ok(Self::HeartbeatAck),
            other => Err(DeError::custom(format!("unknown gateway opcode {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GatewayEvent;

    #[test]
    fn hello_decodes() {
        let frame = r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#;
        let event: GatewayEvent = serde_json::from_str(frame).unwrap();
        assert!(matches!(event, GatewayEvent::Hello(hello) if hello.heartbeat_interval == 41250));
    }

    #[test]
    fn heartbeat_ack_decodes() {
        let frame = r#"{"op":11,"d":null,"s":null,"t":null}"#;
        let event: GatewayEvent = serde_json::from_str(frame).unwrap();
        assert!(matches!(event, GatewayEvent::HeartbeatAck));
    }

    #[test]
    fn unknown_dispatch_type_is_preserved_not_rejected() {
        let frame = r#"{"op":0,"d":{"foo":"bar"},"s":5,"t":"SOMETHING_NEW"}"#;
        let event: GatewayEvent = serde_json::from_str(frame).unwrap();

        match event {
            GatewayEvent::Dispatch(seq, super::DispatchEvent::Unknown { kind, .. }) => {
                assert_eq!(seq, 5);
                assert_eq!(kind, "SOMETHING_NEW");
            }
            _ => panic!("expected an unknown dispatch"),
        }
    }

    #[test]
    fn invalid_session_decodes_bool() {
        let frame = r#"{"op":9,"d":false,"s":null,"t":null}"#;
        let event: GatewayEvent = serde_json::from_str(frame).unwrap();
        assert!(matches!(event, GatewayEvent::InvalidSession(false)));
    }
}
