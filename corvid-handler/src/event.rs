//! Dispatch of a decoded gateway event into a [`Handlers`] registry.
//!
//! A handful of dispatch kinds share one payload type in `corvid-model`
//! (`GuildCreate`/`GuildUpdate` both carry a `Guild`, for instance) because
//! the reducer doesn't need to tell them apart. A typed subscriber does: a
//! handler that asked for "guild created" would otherwise also receive
//! every guild update. These newtypes give each dispatch kind its own
//! identity for subscription purposes without changing the wire model.

use crate::Handlers;
use corvid_model::{
    channel::Channel,
    gateway::event::{DispatchEvent, GuildRoleEvent, MessageReaction},
    guild::Guild,
};
use std::ops::Deref;

macro_rules! marker {
    ($(#[$doc:meta])* $name:ident($inner:ty)) => {
        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $name(pub $inner);

        impl Deref for $name {
            type Target = $inner;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

marker!(
    /// A freshly-available guild, distinct from [`GuildUpdated`].
    GuildCreated(Guild)
);
marker!(
    /// A guild's header fields changed.
    GuildUpdated(Guild)
);
marker!(
    /// A channel was created.
    ChannelCreated(Channel)
);
marker!(
    /// A channel's fields changed.
    ChannelUpdated(Channel)
);
marker!(
    /// A channel was deleted.
    ChannelDeleted(Channel)
);
marker!(
    /// A reaction was added to a message.
    ReactionAdded(MessageReaction)
);
marker!(
    /// A reaction was removed from a message.
    ReactionRemoved(MessageReaction)
);
marker!(
    /// A role was created.
    RoleCreated(GuildRoleEvent)
);
marker!(
    /// A role's fields changed.
    RoleUpdated(GuildRoleEvent)
);

impl Handlers {
    /// Runs pre-handlers for whichever concrete payload type `event` carries.
    pub fn dispatch_pre_event(&self, event: &DispatchEvent) {
        use DispatchEvent::{
            ChannelCreate, ChannelDelete, ChannelUpdate, GuildCreate, GuildDelete,
            GuildEmojisUpdate, GuildMemberAdd, GuildMemberRemove, GuildMemberUpdate,
            GuildRoleCreate, GuildRoleDelete, GuildRoleUpdate, GuildUpdate, MessageCreate,
            MessageDelete, MessageDeleteBulk, MessageReactionAdd, MessageReactionRemove,
            MessageReactionRemoveAll, MessageReactionRemoveEmoji, MessageUpdate, PresenceUpdate,
            Ready, Resumed, Unknown, VoiceStateUpdate,
        };

        match event {
            Ready(ready) => self.dispatch_pre(ready.as_ref()),
            Resumed | Unknown { .. } => {}
            GuildCreate(guild) => self.dispatch_pre(&GuildCreated((**guild).clone())),
            GuildUpdate(guild) => self.dispatch_pre(&GuildUpdated((**guild).clone())),
            GuildDelete(delete) => self.dispatch_pre(delete),
            ChannelCreate(channel) => self.dispatch_pre(&ChannelCreated((**channel).clone())),
            ChannelUpdate(channel) => self.dispatch_pre(&ChannelUpdated((**channel).clone())),
            ChannelDelete(channel) => self.dispatch_pre(&ChannelDeleted((**channel).clone())),
            MessageCreate(message) => self.dispatch_pre(message.as_ref()),
            MessageUpdate(update) => self.dispatch_pre(update.as_ref()),
            MessageDelete(delete) => self.dispatch_pre(delete),
            MessageDeleteBulk(bulk) => self.dispatch_pre(bulk),
            MessageReactionAdd(reaction) => {
                self.dispatch_pre(&ReactionAdded((**reaction).clone()));
            }
            MessageReactionRemove(reaction) => {
                self.dispatch_pre(&ReactionRemoved((**reaction).clone()));
            }
            MessageReactionRemoveAll(all) => self.dispatch_pre(all),
            MessageReactionRemoveEmoji(emoji) => self.dispatch_pre(emoji),
            GuildMemberAdd(add) => self.dispatch_pre(add.as_ref()),
            GuildMemberUpdate(update) => self.dispatch_pre(update.as_ref()),
            GuildMemberRemove(remove) => self.dispatch_pre(remove),
            GuildRoleCreate(role) => self.dispatch_pre(&RoleCreated(role.clone())),
            GuildRoleUpdate(role) => self.dispatch_pre(&RoleUpdated(role.clone())),
            GuildRoleDelete(delete) => self.dispatch_pre(delete),
            PresenceUpdate(presence) => self.dispatch_pre(presence.as_ref()),
            VoiceStateUpdate(voice_state) => self.dispatch_pre(voice_state.as_ref()),
            GuildEmojisUpdate(update) => self.dispatch_pre(update),
        }
    }

    /// Fans `event` out to post-handlers for whichever concrete payload type
    /// it carries.
    pub fn dispatch_post_event(&self, event: DispatchEvent) {
        use DispatchEvent::{
            ChannelCreate, ChannelDelete, ChannelUpdate, GuildCreate, GuildDelete,
            GuildEmojisUpdate, GuildMemberAdd, GuildMemberRemove, GuildMemberUpdate,
            GuildRoleCreate, GuildRoleDelete, GuildRoleUpdate, GuildUpdate, MessageCreate,
            MessageDelete, MessageDeleteBulk, MessageReactionAdd, MessageReactionRemove,
            MessageReactionRemoveAll, MessageReactionRemoveEmoji, MessageUpdate, PresenceUpdate,
            Ready, Resumed, Unknown, VoiceStateUpdate,
        };

        match event {
            Ready(ready) => self.dispatch_post(*ready),
            Resumed | Unknown { .. } => {}
            GuildCreate(guild) => self.dispatch_post(GuildCreated(*guild)),
            GuildUpdate(guild) => self.dispatch_post(GuildUpdated(*guild)),
            GuildDelete(delete) => self.dispatch_post(delete),
            ChannelCreate(channel) => self.dispatch_post(ChannelCreated(*channel)),
            ChannelUpdate(channel) => self.dispatch_post(ChannelUpdated(*channel)),
            ChannelDelete(channel) => self.dispatch_post(ChannelDeleted(*channel)),
            MessageCreate(message) => self.dispatch_post(*message),
            MessageUpdate(update) => self.dispatch_post(*update),
            MessageDelete(delete) => self.dispatch_post(delete),
            MessageDeleteBulk(bulk) => self.dispatch_post(bulk),
            MessageReactionAdd(reaction) => self.dispatch_post(ReactionAdded(*reaction)),
            MessageReactionRemove(reaction) => self.dispatch_post(ReactionRemoved(*reaction)),
            MessageReactionRemoveAll(all) => self.dispatch_post(all),
            MessageReactionRemoveEmoji(emoji) => self.dispatch_post(emoji),
            GuildMemberAdd(add) => self.dispatch_post(*add),
            GuildMemberUpdate(update) => self.dispatch_post(*update),
            GuildMemberRemove(remove) => self.dispatch_post(remove),
            GuildRoleCreate(role) => self.dispatch_post(RoleCreated(role)),
            GuildRoleUpdate(role) => self.dispatch_post(RoleUpdated(role)),
            GuildRoleDelete(delete) => self.dispatch_post(delete),
            PresenceUpdate(presence) => self.dispatch_post(*presence),
            VoiceStateUpdate(voice_state) => self.dispatch_post(*voice_state),
            GuildEmojisUpdate(update) => self.dispatch_post(update),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GuildCreated, GuildUpdated};
    use crate::Handlers;
    use corvid_model::{
        gateway::event::DispatchEvent,
        guild::Guild,
        GuildId, UserId,
    };
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn guild() -> Guild {
        Guild {
            id: GuildId::new(1),
            name: "The Arboretum".into(),
            owner_id: UserId::new(2),
            roles: Vec::new(),
            emojis: Vec::new(),
            features: Vec::new(),
            unavailable: false,
        }
    }

    #[test]
    fn guild_create_and_update_are_distinguishable() {
        let handlers = Handlers::new();
        let created = Arc::new(AtomicUsize::new(0));
        let updated = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&created);
        handlers.on_pre::<GuildCreated>(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let u = Arc::clone(&updated);
        handlers.on_pre::<GuildUpdated>(move |_| {
            u.fetch_add(1, Ordering::SeqCst);
        });

        handlers.dispatch_pre_event(&DispatchEvent::GuildCreate(Box::new(guild())));
        handlers.dispatch_pre_event(&DispatchEvent::GuildUpdate(Box::new(guild())));

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(updated.load(Ordering::SeqCst), 1);
    }
}
