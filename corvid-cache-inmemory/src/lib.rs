//! In-process-memory cache for the Corvid ecosystem.
//!
//! Feed it gateway dispatch events and it keeps a normalized, queryable
//! snapshot of guild/channel/member/message/presence/voice state, so
//! handlers and the REST layer's read-through fallback don't need to hit
//! the network for data the gateway already pushed.
//!
//! ```rust,no_run
//! use corvid_cache_inmemory::Cabinet;
//!
//! let cabinet = Cabinet::builder().message_cache_size(50).build();
//! # let event: corvid_model::gateway::event::DispatchEvent = unreachable!();
//! cabinet.update(&event);
//! ```

mod builder;
mod config;
mod event;
pub mod model;

pub use self::{
    builder::CabinetBuilder,
    config::{Config, ResourceType},
};

use corvid_model::{
    channel::{Channel, Message},
    gateway::event::DispatchEvent,
    guild::{Emoji, Presence, Role, VoiceState},
    user::User,
    ChannelId, EmojiId, GuildId, MessageId, RoleId, UserId,
};
use dashmap::{
    mapref::one::Ref,
    DashMap, DashSet,
};
use model::{CachedGuild, CachedMember};
use std::{
    collections::{HashSet, VecDeque},
    fmt::{Debug, Formatter, Result as FmtResult},
    hash::Hash,
    ops::Deref,
    sync::Mutex,
};

/// Resource associated with a guild but not itself carrying the guild's ID
/// (roles, emojis).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GuildResource<T> {
    guild_id: GuildId,
    value: T,
}

impl<T> GuildResource<T> {
    /// ID of the guild this resource belongs to.
    #[must_use]
    pub const fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// The resource itself.
    #[must_use]
    pub const fn resource(&self) -> &T {
        &self.value
    }
}

impl<T> Deref for GuildResource<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

/// Immutable reference to a resource held in the cabinet.
///
/// Hides the underlying `DashMap` guard type so the concurrent-map choice
/// stays an implementation detail. Hold these as briefly as possible:
/// a write to the same key blocks behind a live reference.
pub struct Reference<'a, K, V> {
    inner: Ref<'a, K, V>,
}

impl<'a, K: Eq + Hash, V> Reference<'a, K, V> {
    fn new(inner: Ref<'a, K, V>) -> Self {
        Self { inner }
    }

    /// The key identifying this resource.
    #[must_use]
    pub fn key(&'a self) -> &'a K {
        self.inner.key()
    }

    /// The resource's value.
    #[must_use]
    pub fn value(&'a self) -> &'a V {
        self.inner.value()
    }
}

impl<K: Eq + Hash, V: Debug> Debug for Reference<'_, K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Reference").field("value", self.value()).finish()
    }
}

impl<'a, K: Eq + Hash, V> Deref for Reference<'a, K, V> {
    type Target = V;

    fn deref(&self) -> &Self::Target {
        self.value()
    }
}

/// An in-process-memory snapshot of gateway-pushed state.
///
/// Cloning a `Cabinet` is not provided; wrap it in an [`std::sync::Arc`] to
/// share it across tasks. Every sub-store is concurrent-safe on its own, but
/// an event's mutations (e.g. `GuildCreate` touching the guild plus its
/// roles, emojis, members) are not applied atomically across stores —
/// readers may observe a guild momentarily without its freshly-created
/// roles if they race a `GuildCreate` being applied.
#[derive(Debug, Default)]
pub struct Cabinet {
    config: Config,
    me: Mutex<Option<User>>,
    channels: DashMap<ChannelId, Channel>,
    private_channels: DashSet<ChannelId>,
    channel_messages: DashMap<ChannelId, VecDeque<MessageId>>,
    guilds: DashMap<GuildId, CachedGuild>,
    guild_channels: DashMap<GuildId, HashSet<ChannelId>>,
    guild_emojis: DashMap<GuildId, HashSet<EmojiId>>,
    guild_members: DashMap<GuildId, HashSet<UserId>>,
    guild_presences: DashMap<GuildId, HashSet<UserId>>,
    guild_roles: DashMap<GuildId, HashSet<RoleId>>,
    unavailable_guilds: DashSet<GuildId>,
    emojis: DashMap<EmojiId, GuildResource<Emoji>>,
    roles: DashMap<RoleId, GuildResource<Role>>,
    members: DashMap<(GuildId, UserId), CachedMember>,
    messages: DashMap<MessageId, Message>,
    presences: DashMap<(GuildId, UserId), Presence>,
    voice_state_channels: DashMap<ChannelId, HashSet<(GuildId, UserId)>>,
    voice_state_guilds: DashMap<GuildId, HashSet<UserId>>,
    voice_states: DashMap<(GuildId, UserId), VoiceState>,
}

impl Cabinet {
    /// Create a new, empty cabinet with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a cabinet with a non-default configuration.
    #[must_use]
    pub fn builder() -> CabinetBuilder {
        CabinetBuilder::new()
    }

    pub(crate) fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Drop every cached resource, as if the cabinet were freshly created.
    pub fn clear(&self) {
        self.me.lock().expect("current user poisoned").take();
        self.channels.clear();
        self.private_channels.clear();
        self.channel_messages.clear();
        self.guilds.clear();
        self.guild_channels.clear();
        self.guild_emojis.clear();
        self.guild_members.clear();
        self.guild_presences.clear();
        self.guild_roles.clear();
        self.unavailable_guilds.clear();
        self.emojis.clear();
        self.roles.clear();
        self.members.clear();
        self.messages.clear();
        self.presences.clear();
        self.voice_state_channels.clear();
        self.voice_state_guilds.clear();
        self.voice_states.clear();
    }

    /// The configuration this cabinet was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Apply a dispatch event, mutating whichever stores it touches.
    pub fn update(&self, value: &impl UpdateCabinet) {
        value.update(self);
    }

    pub(crate) const fn wants(&self, resource_type: ResourceType) -> bool {
        self.config.resource_types().contains(resource_type)
    }

    /// The bot's own user, installed from `Ready`.
    #[must_use]
    pub fn me(&self) -> Option<User> {
        self.me.lock().expect("current user poisoned").clone()
    }

    pub(crate) fn set_me(&self, user: User) {
        self.me.lock().expect("current user poisoned").replace(user);
    }

    /// Gets a channel by ID.
    #[must_use]
    pub fn channel(&self, channel_id: ChannelId) -> Option<Reference<'_, ChannelId, Channel>> {
        self.channels.get(&channel_id).map(Reference::new)
    }

    /// Gets the IDs of messages cached for a channel, newest first.
    #[must_use]
    pub fn channel_messages(
        &self,
        channel_id: ChannelId,
    ) -> Option<Reference<'_, ChannelId, VecDeque<MessageId>>> {
        self.channel_messages.get(&channel_id).map(Reference::new)
    }

    /// Gets a guild by ID.
    #[must_use]
    pub fn guild(&self, guild_id: GuildId) -> Option<Reference<'_, GuildId, CachedGuild>> {
        self.guilds.get(&guild_id).map(Reference::new)
    }

    /// Whether a guild is currently marked unavailable (an outage, or not
    /// yet hydrated past `Ready`).
    #[must_use]
    pub fn guild_unavailable(&self, guild_id: GuildId) -> bool {
        self.unavailable_guilds.contains(&guild_id)
    }

    /// Gets the set of channel IDs belonging to a guild.
    #[must_use]
    pub fn guild_channels(
        &self,
        guild_id: GuildId,
    ) -> Option<Reference<'_, GuildId, HashSet<ChannelId>>> {
        self.guild_channels.get(&guild_id).map(Reference::new)
    }

    /// Gets the set of emoji IDs belonging to a guild.
    #[must_use]
    pub fn guild_emojis(
        &self,
        guild_id: GuildId,
    ) -> Option<Reference<'_, GuildId, HashSet<EmojiId>>> {
        self.guild_emojis.get(&guild_id).map(Reference::new)
    }

    /// Gets the set of member user IDs cached for a guild.
    #[must_use]
    pub fn guild_members(
        &self,
        guild_id: GuildId,
    ) -> Option<Reference<'_, GuildId, HashSet<UserId>>> {
        self.guild_members.get(&guild_id).map(Reference::new)
    }

    /// Gets the set of user IDs with a cached presence in a guild.
    #[must_use]
    pub fn guild_presences(
        &self,
        guild_id: GuildId,
    ) -> Option<Reference<'_, GuildId, HashSet<UserId>>> {
        self.guild_presences.get(&guild_id).map(Reference::new)
    }

    /// Gets the set of role IDs belonging to a guild.
    #[must_use]
    pub fn guild_roles(
        &self,
        guild_id: GuildId,
    ) -> Option<Reference<'_, GuildId, HashSet<RoleId>>> {
        self.guild_roles.get(&guild_id).map(Reference::new)
    }

    /// Gets the set of user IDs connected to a guild's voice channels.
    #[must_use]
    pub fn guild_voice_states(
        &self,
        guild_id: GuildId,
    ) -> Option<Reference<'_, GuildId, HashSet<UserId>>> {
        self.voice_state_guilds.get(&guild_id).map(Reference::new)
    }

    /// Gets an emoji by ID.
    #[must_use]
    pub fn emoji(
        &self,
        emoji_id: EmojiId,
    ) -> Option<Reference<'_, EmojiId, GuildResource<Emoji>>> {
        self.emojis.get(&emoji_id).map(Reference::new)
    }

    /// Gets a role by ID.
    #[must_use]
    pub fn role(&self, role_id: RoleId) -> Option<Reference<'_, RoleId, GuildResource<Role>>> {
        self.roles.get(&role_id).map(Reference::new)
    }

    /// Gets a member by guild ID and user ID.
    #[must_use]
    pub fn member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Option<Reference<'_, (GuildId, UserId), CachedMember>> {
        self.members.get(&(guild_id, user_id)).map(Reference::new)
    }

    /// Gets a message by ID.
    #[must_use]
    pub fn message(&self, message_id: MessageId) -> Option<Reference<'_, MessageId, Message>> {
        self.messages.get(&message_id).map(Reference::new)
    }

    /// Gets a presence by guild ID and user ID.
    #[must_use]
    pub fn presence(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Option<Reference<'_, (GuildId, UserId), Presence>> {
        self.presences.get(&(guild_id, user_id)).map(Reference::new)
    }

    /// Gets a voice state by guild ID and user ID.
    #[must_use]
    pub fn voice_state(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Option<Reference<'_, (GuildId, UserId), VoiceState>> {
        self.voice_states.get(&(guild_id, user_id)).map(Reference::new)
    }
}

/// Implemented for every dispatch payload that can mutate a [`Cabinet`].
pub trait UpdateCabinet {
    /// Apply this event's data to the cabinet.
    #[allow(unused_variables)]
    fn update(&self, cabinet: &Cabinet) {}
}

impl UpdateCabinet for DispatchEvent {
    fn update(&self, c: &Cabinet) {
        use DispatchEvent::{
            ChannelCreate, ChannelDelete, ChannelUpdate, GuildCreate, GuildDelete,
            GuildEmojisUpdate, GuildMemberAdd, GuildMemberRemove, GuildMemberUpdate,
            GuildRoleCreate, GuildRoleDelete, GuildRoleUpdate, GuildUpdate, MessageCreate,
            MessageDelete, MessageDeleteBulk, MessageReactionAdd, MessageReactionRemove,
            MessageReactionRemoveAll, MessageReactionRemoveEmoji, MessageUpdate, PresenceUpdate,
            Ready, Resumed, Unknown, VoiceStateUpdate,
        };

        match self {
            Ready(ready) => c.update(ready.as_ref()),
            Resumed | Unknown { .. } => {}
            GuildCreate(guild) => c.cache_guild(guild),
            GuildUpdate(guild) => c.update_guild(guild),
            GuildDelete(delete) => c.update(delete),
            ChannelCreate(channel) | ChannelUpdate(channel) => c.cache_channel(channel),
            ChannelDelete(channel) => c.delete_channel(channel),
            MessageCreate(message) => c.cache_message(message),
            MessageUpdate(update) => c.update(update.as_ref()),
            MessageDelete(delete) => c.update(delete),
            MessageDeleteBulk(bulk) => c.update(bulk),
            MessageReactionAdd(reaction) => c.add_reaction(reaction),
            MessageReactionRemove(reaction) => c.remove_reaction(reaction),
            MessageReactionRemoveAll(all) => c.update(all),
            MessageReactionRemoveEmoji(emoji) => c.update(emoji),
            GuildMemberAdd(add) => c.update(add.as_ref()),
            GuildMemberUpdate(update) => c.update(update.as_ref()),
            GuildMemberRemove(remove) => c.update(remove),
            GuildRoleCreate(role) | GuildRoleUpdate(role) => c.cache_role(role),
            GuildRoleDelete(delete) => c.update(delete),
            PresenceUpdate(presence) => c.update(presence.as_ref()),
            VoiceStateUpdate(voice_state) => c.update(voice_state.as_ref()),
            GuildEmojisUpdate(update) => c.update(update),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cabinet, GuildResource, Reference};
    use static_assertions::assert_impl_all;
    use std::fmt::Debug;

    assert_impl_all!(Cabinet: Debug, Send, Sync);
    assert_impl_all!(GuildResource<u8>: Clone, Debug, Eq, PartialEq, Send, Sync);
    assert_impl_all!(Reference<'static, u8, u8>: Debug, Send, Sync);

    #[test]
    fn new_cabinet_has_no_current_user() {
        let cabinet = Cabinet::new();
        assert!(cabinet.me().is_none());
    }
}
