pub mod embed;
pub mod message;

pub use embed::Embed;
pub use message::Message;

use crate::{nullable::Nullable, ChannelId, GuildId};
use serde::{
    de::{Deserialize, Deserializer, Error as DeError},
    ser::{Serialize, Serializer},
};

/// Discriminant of a [`Channel`]'s kind, as sent on the wire.
///
/// Carries an [`Self::Unknown`] catch-all so that forward-compatible
/// deserialization never fails on a channel type this crate doesn't yet
/// know about, and re-serializes the original discriminant byte-for-byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChannelType {
    GuildText,
    Dm,
    GuildVoice,
    GroupDm,
    GuildCategory,
    GuildAnnouncement,
    AnnouncementThread,
    PublicThread,
    PrivateThread,
    GuildStageVoice,
    GuildForum,
    /// A channel type not recognized by this version of the crate.
    Unknown(u8),
}

impl ChannelType {
    const fn value(self) -> u8 {
        match self {
            Self::GuildText => 0,
            Self::Dm => 1,
            Self::GuildVoice => 2,
            Self::GroupDm => 3,
            Self::GuildCategory => 4,
            Self::GuildAnnouncement => 5,
            Self::AnnouncementThread => 10,
            Self::PublicThread => 11,
            Self::PrivateThread => 12,
            Self::GuildStageVoice => 13,
            Self::GuildForum => 15,
            Self::Unknown(other) => other,
        }
    }

    const fn from_value(value: u8) -> Self {
        match value {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            5 => Self::GuildAnnouncement,
            10 => Self::AnnouncementThread,
            11 => Self::PublicThread,
            12 => Self::PrivateThread,
            13 => Self::GuildStageVoice,
            15 => Self::GuildForum,
            other => Self::Unknown(other),
        }
    }

    /// Whether this channel type is one of the thread variants.
    #[must_use]
    pub const fn is_thread(self) -> bool {
        matches!(
            self,
            Self::AnnouncementThread | Self::PublicThread | Self::PrivateThread
        )
    }
}

impl<'de> Deserialize<'de> for ChannelType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Ok(Self::from_value(value))
    }
}

impl Serialize for ChannelType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.value())
    }
}

/// A text, voice, category, thread or DM channel.
///
/// `parent_id` uses [`Nullable`] because the platform explicitly nulls it
/// out (rather than omitting it) when a channel is moved out of a category.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Channel {
    pub id: ChannelId,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<GuildId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub parent_id: Nullable<ChannelId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<ChannelId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
}

#[cfg(test)]
mod tests {
    use super::{Channel, ChannelType};
    use crate::{nullable::Nullable, ChannelId};

    #[test]
    fn unknown_channel_type_preserves_byte() {
        let ty: ChannelType = serde_json::from_str("42").unwrap();
        assert_eq!(ty, ChannelType::Unknown(42));
        assert_eq!(serde_json::to_string(&ty).unwrap(), "42");
    }

    #[test]
    fn known_channel_type_round_trips() {
        let ty: ChannelType = serde_json::from_str("5").unwrap();
        assert_eq!(ty, ChannelType::GuildAnnouncement);
        assert_eq!(serde_json::to_string(&ty).unwrap(), "5");
    }

    #[test]
    fn channel_round_trip_with_null_parent() {
        let channel = Channel {
            id: ChannelId::new(1),
            kind: ChannelType::GuildText,
            guild_id: None,
            name: Some("general".into()),
            position: Some(0),
            parent_id: Nullable::Null,
            last_message_id: None,
            topic: None,
            nsfw: false,
        };

        let json = serde_json::to_string(&channel).unwrap();
        assert!(json.contains("\"parent_id\":null"));

        let decoded: Channel = serde_json::from_str(&json).unwrap();
        assert_eq!(channel, decoded);
    }

    #[test]
    fn absent_parent_id_omitted_from_output() {
        let channel = Channel {
            id: ChannelId::new(1),
            kind: ChannelType::GuildVoice,
            guild_id: None,
            name: None,
            position: None,
            parent_id: Nullable::Absent,
            last_message_id: None,
            topic: None,
            nsfw: false,
        };

        let json = serde_json::to_string(&channel).unwrap();
        assert!(!json.contains("parent_id"));
    }
}
