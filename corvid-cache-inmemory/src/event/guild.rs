use crate::{config::ResourceType, model::CachedGuild, model::CachedMember, Cabinet, GuildResource, UpdateCabinet};
use corvid_model::gateway::event::GuildDelete;
use dashmap::DashMap;
use std::{collections::HashSet, hash::Hash};

fn remove_ids<K: Eq + Hash, T: Eq + Hash, V>(
    guild_map: &DashMap<K, HashSet<T>>,
    guild_id: K,
    container: &DashMap<T, V>,
) {
    if let Some((_, ids)) = guild_map.remove(&guild_id) {
        for id in ids {
            container.remove(&id);
        }
    }
}

impl Cabinet {
    pub(crate) fn cache_guild(&self, guild: &corvid_model::guild::Guild) {
        if !self.wants(ResourceType::GUILD) {
            return;
        }

        if self.wants(ResourceType::ROLE) {
            let mut ids = HashSet::with_capacity(guild.roles.len());

            for role in &guild.roles {
                ids.insert(role.id);
                self.roles.insert(
                    role.id,
                    GuildResource {
                        guild_id: guild.id,
                        value: role.clone(),
                    },
                );
            }

            self.guild_roles.insert(guild.id, ids);
        }

        if self.wants(ResourceType::EMOJI) {
            let mut ids = HashSet::with_capacity(guild.emojis.len());

            for emoji in &guild.emojis {
                ids.insert(emoji.id);
                self.emojis.insert(
                    emoji.id,
                    GuildResource {
                        guild_id: guild.id,
                        value: emoji.clone(),
                    },
                );
            }

            self.guild_emojis.insert(guild.id, ids);
        }

        if self.wants(ResourceType::CHANNEL) {
            let mut ids = HashSet::with_capacity(guild.channels.len());

            for channel in &guild.channels {
                ids.insert(channel.id);
                let mut channel = channel.clone();
                channel.guild_id = Some(guild.id);
                self.channels.insert(channel.id, channel);
            }

            self.guild_channels.insert(guild.id, ids);
        }

        if self.wants(ResourceType::MEMBER) {
            let mut ids = HashSet::with_capacity(guild.members.len());

            for member in &guild.members {
                ids.insert(member.user_id);
                self.members.insert(
                    (guild.id, member.user_id),
                    CachedMember::from_member(guild.id, member),
                );
            }

            self.guild_members.insert(guild.id, ids);
        }

        if self.wants(ResourceType::VOICE_STATE) {
            for voice_state in &guild.voice_states {
                self.update(voice_state);
            }
        }

        if self.wants(ResourceType::PRESENCE) {
            for presence in &guild.presences {
                self.update(presence);
            }
        }

        self.unavailable_guilds.remove(&guild.id);
        self.guilds.insert(guild.id, CachedGuild::from_guild(guild));
    }

    pub(crate) fn update_guild(&self, guild: &corvid_model::guild::Guild) {
        if !self.wants(ResourceType::GUILD) {
            return;
        }

        if let Some(mut cached) = self.guilds.get_mut(&guild.id) {
            cached.name = guild.name.clone();
            cached.owner_id = guild.owner_id;
            cached.features = guild.features.clone();
        }
    }
}

impl UpdateCabinet for GuildDelete {
    fn update(&self, cabinet: &Cabinet) {
        if !cabinet.wants(ResourceType::GUILD) {
            return;
        }

        cabinet.guilds.remove(&self.id);

        if self.unavailable {
            cabinet.unavailable_guilds.insert(self.id);
        }

        if cabinet.wants(ResourceType::ROLE) {
            remove_ids(&cabinet.guild_roles, self.id, &cabinet.roles);
        }

        if cabinet.wants(ResourceType::EMOJI) {
            remove_ids(&cabinet.guild_emojis, self.id, &cabinet.emojis);
        }

        if cabinet.wants(ResourceType::CHANNEL) {
            if let Some((_, ids)) = cabinet.guild_channels.remove(&self.id) {
                for channel_id in ids {
                    cabinet.channels.remove(&channel_id);
                    cabinet.channel_messages.remove(&channel_id);
                }
            }
        }

        if cabinet.wants(ResourceType::MEMBER) {
            if let Some((_, ids)) = cabinet.guild_members.remove(&self.id) {
                for user_id in ids {
                    cabinet.members.remove(&(self.id, user_id));
                }
            }
        }

        if cabinet.wants(ResourceType::PRESENCE) {
            if let Some((_, ids)) = cabinet.guild_presences.remove(&self.id) {
                for user_id in ids {
                    cabinet.presences.remove(&(self.id, user_id));
                }
            }
        }

        if cabinet.wants(ResourceType::VOICE_STATE) {
            if let Some((_, ids)) = cabinet.voice_state_guilds.remove(&self.id) {
                for user_id in ids {
                    cabinet.voice_states.remove(&(self.id, user_id));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Cabinet;
    use corvid_model::{
        channel::{Channel, ChannelType},
        gateway::event::GuildDelete,
        guild::{Guild, Member, Presence, PresenceStatus, Role, VoiceState},
        nullable::Nullable,
        ChannelId, GuildId, RoleId, Timestamp, UserId,
    };
    use std::str::FromStr;

    fn sample_guild() -> Guild {
        Guild {
            id: GuildId::new(1),
            name: "The Arboretum".into(),
            owner_id: UserId::new(2),
            roles: vec![Role {
                id: RoleId::new(3),
                name: "everyone".into(),
                color: 0,
                hoist: false,
                position: 0,
                permissions: "0".into(),
                managed: false,
                mentionable: false,
            }],
            emojis: Vec::new(),
            features: Vec::new(),
            unavailable: false,
            channels: vec![Channel {
                id: ChannelId::new(4),
                kind: ChannelType::GuildText,
                guild_id: None,
                name: Some("general".into()),
                position: Some(0),
                parent_id: Nullable::Absent,
                last_message_id: None,
                topic: None,
                nsfw: false,
            }],
            members: vec![Member {
                user_id: UserId::new(5),
                nick: None,
                roles: Vec::new(),
                joined_at: Timestamp::from_str("2024-01-01T00:00:00Z").unwrap(),
                deaf: false,
                mute: false,
                pending: false,
            }],
            voice_states: vec![VoiceState {
                guild_id: GuildId::new(1),
                user_id: UserId::new(5),
                channel_id: None,
                session_id: "session".into(),
                deaf: false,
                mute: false,
                self_deaf: false,
                self_mute: false,
            }],
            presences: vec![Presence {
                user_id: UserId::new(5),
                guild_id: GuildId::new(1),
                status: PresenceStatus::Online,
            }],
        }
    }

    #[test]
    fn applying_guild_create_twice_is_idempotent() {
        let cabinet = Cabinet::new();
        cabinet.cache_guild(&sample_guild());
        cabinet.cache_guild(&sample_guild());

        assert_eq!(cabinet.guild(GuildId::new(1)).unwrap().name, "The Arboretum");
        assert_eq!(cabinet.guild_roles(GuildId::new(1)).unwrap().len(), 1);
        assert!(cabinet.role(RoleId::new(3)).is_some());
    }

    #[test]
    fn guild_create_installs_nested_channels_members_and_presences() {
        let cabinet = Cabinet::new();
        cabinet.cache_guild(&sample_guild());

        assert!(cabinet.channel(ChannelId::new(4)).is_some());
        assert_eq!(cabinet.channel(ChannelId::new(4)).unwrap().guild_id, Some(GuildId::new(1)));
        assert!(cabinet
            .guild_channels(GuildId::new(1))
            .unwrap()
            .contains(&ChannelId::new(4)));

        assert!(cabinet.member(GuildId::new(1), UserId::new(5)).is_some());
        assert!(cabinet.presence(GuildId::new(1), UserId::new(5)).is_some());
    }

    #[test]
    fn guild_delete_cascades_to_roles() {
        let cabinet = Cabinet::new();
        cabinet.cache_guild(&sample_guild());

        cabinet.update(&GuildDelete {
            id: GuildId::new(1),
            unavailable: false,
        });

        assert!(cabinet.guild(GuildId::new(1)).is_none());
        assert!(cabinet.role(RoleId::new(3)).is_none());
        assert!(cabinet.guild_roles(GuildId::new(1)).is_none());
        assert!(cabinet.channel(ChannelId::new(4)).is_none());
        assert!(cabinet.member(GuildId::new(1), UserId::new(5)).is_none());
    }
}
