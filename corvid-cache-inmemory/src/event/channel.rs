use crate::{config::ResourceType, Cabinet};
use corvid_model::channel::Channel;

impl Cabinet {
    pub(crate) fn cache_channel(&self, channel: &Channel) {
        if !self.wants(ResourceType::CHANNEL) {
            return;
        }

        match channel.guild_id {
            Some(guild_id) => {
                self.guild_channels
                    .entry(guild_id)
                    .or_default()
                    .insert(channel.id);
            }
            None => {
                self.private_channels.insert(channel.id);
            }
        }

        self.channels.insert(channel.id, channel.clone());
    }

    pub(crate) fn delete_channel(&self, channel: &Channel) {
        if !self.wants(ResourceType::CHANNEL) {
            return;
        }

        self.channels.remove(&channel.id);
        self.channel_messages.remove(&channel.id);
        self.private_channels.remove(&channel.id);

        if let Some(guild_id) = channel.guild_id {
            if let Some(mut channels) = self.guild_channels.get_mut(&guild_id) {
                channels.remove(&channel.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Cabinet;
    use corvid_model::{
        channel::{Channel, ChannelType},
        nullable::Nullable,
        ChannelId, GuildId,
    };

    fn guild_channel() -> Channel {
        Channel {
            id: ChannelId::new(1),
            kind: ChannelType::GuildText,
            guild_id: Some(GuildId::new(2)),
            name: Some("general".into()),
            position: Some(0),
            parent_id: Nullable::Absent,
            last_message_id: None,
            topic: None,
            nsfw: false,
        }
    }

    #[test]
    fn guild_channel_is_indexed_under_its_guild() {
        let cabinet = Cabinet::new();
        cabinet.cache_channel(&guild_channel());

        assert!(cabinet.channel(ChannelId::new(1)).is_some());
        assert!(cabinet
            .guild_channels(GuildId::new(2))
            .unwrap()
            .contains(&ChannelId::new(1)));
    }

    #[test]
    fn deleting_a_channel_removes_it_from_its_guild_index() {
        let cabinet = Cabinet::new();
        cabinet.cache_channel(&guild_channel());
        cabinet.delete_channel(&guild_channel());

        assert!(cabinet.channel(ChannelId::new(1)).is_none());
        assert!(!cabinet
            .guild_channels(GuildId::new(2))
            .unwrap()
            .contains(&ChannelId::new(1)));
    }
}
