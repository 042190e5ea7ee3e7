use crate::{config::ResourceType, Cabinet, GuildResource, UpdateCabinet};
use corvid_model::gateway::event::GuildEmojisUpdate;
use std::collections::HashSet;

impl UpdateCabinet for GuildEmojisUpdate {
    fn update(&self, cabinet: &Cabinet) {
        if !cabinet.wants(ResourceType::EMOJI) {
            return;
        }

        if let Some((_, old_ids)) = cabinet.guild_emojis.remove(&self.guild_id) {
            for id in old_ids {
                cabinet.emojis.remove(&id);
            }
        }

        let mut ids = HashSet::with_capacity(self.emojis.len());

        for emoji in &self.emojis {
            ids.insert(emoji.id);
            cabinet.emojis.insert(
                emoji.id,
                GuildResource {
                    guild_id: self.guild_id,
                    value: emoji.clone(),
                },
            );
        }

        cabinet.guild_emojis.insert(self.guild_id, ids);
    }
}
