use crate::{config::ResourceType, Cabinet, UpdateCabinet};
use corvid_model::{
    channel::message::{Reaction, ReactionEmoji},
    gateway::event::{
        MessageReaction, MessageReactionRemoveAll, MessageReactionRemoveEmoji, ReactionEventEmoji,
    },
};

fn matches(stored: &ReactionEmoji, event: &ReactionEventEmoji) -> bool {
    stored.id == event.id && stored.name == event.name
}

impl Cabinet {
    pub(crate) fn add_reaction(&self, reaction: &MessageReaction) {
        if !self.wants(ResourceType::MESSAGE) {
            return;
        }

        if let Some(mut message) = self.messages.get_mut(&reaction.message_id) {
            match message
                .reactions
                .iter_mut()
                .find(|r| matches(&r.emoji, &reaction.emoji))
            {
                Some(existing) => existing.count += 1,
                None => message.reactions.push(Reaction {
                    emoji: ReactionEmoji {
                        id: reaction.emoji.id,
                        name: reaction.emoji.name.clone(),
                    },
                    count: 1,
                    me: false,
                }),
            }
        }
    }

    pub(crate) fn remove_reaction(&self, reaction: &MessageReaction) {
        if !self.wants(ResourceType::MESSAGE) {
            return;
        }

        if let Some(mut message) = self.messages.get_mut(&reaction.message_id) {
            if let Some(idx) = message
                .reactions
                .iter()
                .position(|r| matches(&r.emoji, &reaction.emoji))
            {
                message.reactions[idx].count = message.reactions[idx].count.saturating_sub(1);

                if message.reactions[idx].count == 0 {
                    message.reactions.remove(idx);
                }
            }
        }
    }
}

impl UpdateCabinet for MessageReactionRemoveAll {
    fn update(&self, cabinet: &Cabinet) {
        if !cabinet.wants(ResourceType::MESSAGE) {
            return;
        }

        if let Some(mut message) = cabinet.messages.get_mut(&self.message_id) {
            message.reactions.clear();
        }
    }
}

impl UpdateCabinet for MessageReactionRemoveEmoji {
    fn update(&self, cabinet: &Cabinet) {
        if !cabinet.wants(ResourceType::MESSAGE) {
            return;
        }

        if let Some(mut message) = cabinet.messages.get_mut(&self.message_id) {
            if let Some(idx) = message
                .reactions
                .iter()
                .position(|r| matches(&r.emoji, &self.emoji))
            {
                message.reactions.remove(idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Cabinet;
    use corvid_model::{
        channel::Message,
        gateway::event::{
            MessageReaction, MessageReactionRemoveAll, MessageReactionRemoveEmoji,
            ReactionEventEmoji,
        },
        nullable::Nullable,
        ChannelId, MessageId, Timestamp, UserId,
    };
    use std::str::FromStr;

    fn message() -> Message {
        Message {
            id: MessageId::new(1),
            channel_id: ChannelId::new(2),
            guild_id: None,
            author_id: UserId::new(3),
            content: String::new(),
            timestamp: Timestamp::from_str("2024-01-01T00:00:00Z").unwrap(),
            edited_timestamp: Nullable::Absent,
            embeds: Vec::new(),
            attachments: Vec::new(),
            reactions: Vec::new(),
            pinned: false,
            tts: false,
        }
    }

    fn reaction() -> MessageReaction {
        MessageReaction {
            message_id: MessageId::new(1),
            channel_id: ChannelId::new(2),
            user_id: UserId::new(4),
            emoji: ReactionEventEmoji {
                id: None,
                name: Some("👍".into()),
            },
        }
    }

    #[test]
    fn repeated_adds_tally_a_single_reaction_entry() {
        let cabinet = Cabinet::new();
        cabinet.cache_message(&message());

        cabinet.add_reaction(&reaction());
        cabinet.add_reaction(&reaction());

        let cached = cabinet.message(MessageId::new(1)).unwrap();
        assert_eq!(cached.reactions.len(), 1);
        assert_eq!(cached.reactions[0].count, 2);
    }

    #[test]
    fn removing_the_last_reaction_drops_the_entry() {
        let cabinet = Cabinet::new();
        cabinet.cache_message(&message());

        cabinet.add_reaction(&reaction());
        cabinet.remove_reaction(&reaction());

        let cached = cabinet.message(MessageId::new(1)).unwrap();
        assert!(cached.reactions.is_empty());
    }

    #[test]
    fn remove_all_clears_every_reaction() {
        let cabinet = Cabinet::new();
        cabinet.cache_message(&message());
        cabinet.add_reaction(&reaction());

        cabinet.update(&MessageReactionRemoveAll {
            message_id: MessageId::new(1),
            channel_id: ChannelId::new(2),
        });

        assert!(cabinet.message(MessageId::new(1)).unwrap().reactions.is_empty());
    }

    #[test]
    fn remove_emoji_clears_only_that_emoji() {
        let cabinet = Cabinet::new();
        cabinet.cache_message(&message());
        cabinet.add_reaction(&reaction());

        cabinet.update(&MessageReactionRemoveEmoji {
            message_id: MessageId::new(1),
            channel_id: ChannelId::new(2),
            emoji: reaction().emoji,
        });

        assert!(cabinet.message(MessageId::new(1)).unwrap().reactions.is_empty());
    }
}
