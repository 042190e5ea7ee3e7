use super::embed::Embed;
use crate::{
    nullable::Nullable, AttachmentId, ChannelId, EmojiId, GuildId, MessageId, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};

/// A file uploaded alongside a message.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub filename: String,
    pub size: u64,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// A tally of reactions of one emoji on a message.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Reaction {
    pub emoji: ReactionEmoji,
    pub count: u64,
    #[serde(default)]
    pub me: bool,
}

/// The (possibly custom) emoji identifying a [`Reaction`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ReactionEmoji {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EmojiId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A message posted to a channel.
///
/// `edited_timestamp` uses [`Nullable`]: a `MessageUpdate` payload omits it
/// entirely when the content wasn't edited, but the platform sends an
/// explicit `null` on the initial `MessageCreate`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<GuildId>,
    pub author_id: UserId,
    #[serde(default)]
    pub content: String,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub edited_timestamp: Nullable<Timestamp>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub tts: bool,
}

#[cfg(test)]
mod tests {
    use super::{Message, Reaction, ReactionEmoji};
    use crate::{nullable::Nullable, ChannelId, MessageId, Timestamp, UserId};
    use std::str::FromStr;

    fn sample() -> Message {
        Message {
            id: MessageId::new(1),
            channel_id: ChannelId::new(2),
            guild_id: None,
            author_id: UserId::new(3),
            content: "hi".into(),
            timestamp: Timestamp::from_str("2024-01-01T00:00:00Z").unwrap(),
            edited_timestamp: Nullable::Null,
            embeds: Vec::new(),
            attachments: Vec::new(),
            reactions: vec![Reaction {
                emoji: ReactionEmoji {
                    id: None,
                    name: Some("👍".into()),
                },
                count: 1,
                me: false,
            }],
            pinned: false,
            tts: false,
        }
    }

    #[test]
    fn round_trip() {
        let message = sample();
        let json = serde_json::to_string(&message).unwrap();
        let decoded: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(message, decoded);
    }

    #[test]
    fn edited_timestamp_distinguishes_absent_from_null() {
        let json = r#"{
            "id":"1","channel_id":"2","author_id":"3",
            "content":"hi","timestamp":"2024-01-01T00:00:00Z"
        }"#;

        let message: Message = serde_json::from_str(json).unwrap();
        assert!(matches!(message.edited_timestamp, Nullable::Absent));
    }
}
