//! Cached shapes that differ from their wire form.
//!
//! Channels, messages, presences and voice states are already minimal
//! enough that the wire model doubles as the cached model, so only guilds
//! (nested roles/emojis stripped into their own stores) and members (a
//! guild ID folded in) get dedicated types here.

use corvid_model::{
    guild::{Guild, Member},
    GuildId, RoleId, Timestamp, UserId,
};

/// A cached [`Guild`] with its nested roles and emojis normalized out into
/// [`Cabinet`](crate::Cabinet)'s own `roles`/`emojis` stores.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CachedGuild {
    pub id: GuildId,
    pub name: String,
    pub owner_id: UserId,
    pub features: Vec<String>,
    pub unavailable: bool,
}

impl CachedGuild {
    pub(crate) fn from_guild(guild: &Guild) -> Self {
        Self {
            id: guild.id,
            name: guild.name.clone(),
            owner_id: guild.owner_id,
            features: guild.features.clone(),
            unavailable: guild.unavailable,
        }
    }
}

/// A cached guild member, with the guild ID folded in since [`Member`]
/// itself doesn't carry one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CachedMember {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub nick: Option<String>,
    pub roles: Vec<RoleId>,
    pub joined_at: Timestamp,
    pub deaf: bool,
    pub mute: bool,
    pub pending: bool,
}

impl CachedMember {
    pub(crate) fn from_member(guild_id: GuildId, member: &Member) -> Self {
        Self {
            guild_id,
            user_id: member.user_id,
            nick: member.nick.clone(),
            roles: member.roles.clone(),
            joined_at: member.joined_at,
            deaf: member.deaf,
            mute: member.mute,
            pending: member.pending,
        }
    }
}
