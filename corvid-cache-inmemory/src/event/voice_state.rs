use crate::{config::ResourceType, Cabinet, UpdateCabinet};
use corvid_model::guild::VoiceState;

impl UpdateCabinet for VoiceState {
    fn update(&self, cabinet: &Cabinet) {
        if !cabinet.wants(ResourceType::VOICE_STATE) {
            return;
        }

        let key = (self.guild_id, self.user_id);

        if let Some(previous) = cabinet.voice_states.get(&key) {
            if let Some(channel_id) = previous.channel_id {
                let now_empty = cabinet
                    .voice_state_channels
                    .get_mut(&channel_id)
                    .map(|mut members| {
                        members.remove(&key);
                        members.is_empty()
                    })
                    .unwrap_or_default();

                if now_empty {
                    cabinet.voice_state_channels.remove(&channel_id);
                }
            }
        }

        if self.channel_id.is_none() {
            let now_empty = cabinet
                .voice_state_guilds
                .get_mut(&self.guild_id)
                .map(|mut members| {
                    members.remove(&self.user_id);
                    members.is_empty()
                })
                .unwrap_or_default();

            if now_empty {
                cabinet.voice_state_guilds.remove(&self.guild_id);
            }

            cabinet.voice_states.remove(&key);
            return;
        }

        let channel_id = self.channel_id;
        cabinet.voice_states.insert(key, self.clone());

        cabinet
            .voice_state_guilds
            .entry(self.guild_id)
            .or_default()
            .insert(self.user_id);

        if let Some(channel_id) = channel_id {
            cabinet
                .voice_state_channels
                .entry(channel_id)
                .or_default()
                .insert(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Cabinet;
    use corvid_model::{guild::VoiceState, ChannelId, GuildId, UserId};

    fn state(channel_id: Option<ChannelId>) -> VoiceState {
        VoiceState {
            guild_id: GuildId::new(1),
            user_id: UserId::new(2),
            channel_id,
            session_id: "session".into(),
            deaf: false,
            mute: false,
            self_deaf: false,
            self_mute: false,
        }
    }

    #[test]
    fn joining_a_channel_indexes_the_member_under_it() {
        let cabinet = Cabinet::new();
        cabinet.update(&state(Some(ChannelId::new(3))));

        assert!(cabinet
            .voice_state(GuildId::new(1), UserId::new(2))
            .is_some());
        assert!(cabinet
            .guild_voice_states(GuildId::new(1))
            .unwrap()
            .contains(&UserId::new(2)));
    }

    #[test]
    fn switching_channels_moves_the_member_to_the_new_index() {
        let cabinet = Cabinet::new();
        cabinet.update(&state(Some(ChannelId::new(3))));
        cabinet.update(&state(Some(ChannelId::new(4))));

        assert_eq!(
            cabinet
                .voice_state(GuildId::new(1), UserId::new(2))
                .unwrap()
                .channel_id,
            Some(ChannelId::new(4))
        );
    }

    #[test]
    fn leaving_voice_entirely_clears_the_state() {
        let cabinet = Cabinet::new();
        cabinet.update(&state(Some(ChannelId::new(3))));
        cabinet.update(&state(None));

        assert!(cabinet
            .voice_state(GuildId::new(1), UserId::new(2))
            .is_none());
        assert!(cabinet.guild_voice_states(GuildId::new(1)).is_none());
    }
}
