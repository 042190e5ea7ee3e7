use crate::{config::ResourceType, Cabinet, UpdateCabinet};
use corvid_model::{
    channel::Message,
    gateway::event::{MessageDelete, MessageDeleteBulk, MessageUpdate},
};

impl Cabinet {
    pub(crate) fn cache_message(&self, message: &Message) {
        if !self.wants(ResourceType::MESSAGE) {
            return;
        }

        let mut channel_messages = self.channel_messages.entry(message.channel_id).or_default();
        channel_messages.push_front(message.id);

        while channel_messages.len() > self.config.message_cache_size() {
            if let Some(evicted) = channel_messages.pop_back() {
                self.messages.remove(&evicted);
            }
        }

        drop(channel_messages);
        self.messages.insert(message.id, message.clone());
    }
}

impl UpdateCabinet for MessageDelete {
    fn update(&self, cabinet: &Cabinet) {
        if !cabinet.wants(ResourceType::MESSAGE) {
            return;
        }

        cabinet.messages.remove(&self.id);

        if let Some(mut channel_messages) = cabinet.channel_messages.get_mut(&self.channel_id) {
            if let Some(idx) = channel_messages.iter().position(|id| *id == self.id) {
                channel_messages.remove(idx);
            }
        }
    }
}

impl UpdateCabinet for MessageDeleteBulk {
    fn update(&self, cabinet: &Cabinet) {
        if !cabinet.wants(ResourceType::MESSAGE) {
            return;
        }

        let mut channel_messages = cabinet.channel_messages.entry(self.channel_id).or_default();

        for id in &self.ids {
            cabinet.messages.remove(id);

            if let Some(idx) = channel_messages.iter().position(|cached| cached == id) {
                channel_messages.remove(idx);
            }
        }
    }
}

impl UpdateCabinet for MessageUpdate {
    fn update(&self, cabinet: &Cabinet) {
        if !cabinet.wants(ResourceType::MESSAGE) {
            return;
        }

        if let Some(mut message) = cabinet.messages.get_mut(&self.id) {
            if let Some(content) = &self.content {
                message.content = content.clone();
            }

            if !self.edited_timestamp.is_absent() {
                message.edited_timestamp = self.edited_timestamp.clone();
            }
        }
    }
}
