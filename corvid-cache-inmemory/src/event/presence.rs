use crate::{config::ResourceType, Cabinet, UpdateCabinet};
use corvid_model::guild::Presence;

impl UpdateCabinet for Presence {
    fn update(&self, cabinet: &Cabinet) {
        if !cabinet.wants(ResourceType::PRESENCE) {
            return;
        }

        cabinet
            .guild_presences
            .entry(self.guild_id)
            .or_default()
            .insert(self.user_id);

        cabinet
            .presences
            .insert((self.guild_id, self.user_id), self.clone());
    }
}
