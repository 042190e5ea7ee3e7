use crate::{channel::Channel, ChannelId, EmojiId, GuildId, RoleId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A permission role scoped to a guild.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub color: u32,
    pub hoist: bool,
    pub position: i64,
    pub permissions: String,
    pub managed: bool,
    pub mentionable: bool,
}

/// A custom emoji uploaded to a guild.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Emoji {
    pub id: EmojiId,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<RoleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub require_colons: bool,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub available: bool,
}

/// A guild member: the user plus their guild-scoped attributes.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Member {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
    pub joined_at: Timestamp,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub pending: bool,
}

/// A non-exhaustive status snapshot of a user within a guild, pushed by
/// presence-update dispatches when the `GuildPresences` intent is active.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Presence {
    pub user_id: UserId,
    pub guild_id: GuildId,
    pub status: PresenceStatus,
}

/// The coarse availability state carried by a [`Presence`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Idle,
    Dnd,
    Offline,
}

/// A user's connection to a guild's voice channel.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VoiceState {
    pub guild_id: GuildId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
    pub session_id: String,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub self_deaf: bool,
    #[serde(default)]
    pub self_mute: bool,
}

/// A guild (colloquially, a "server"): a named collection of channels,
/// members, roles and emoji.
///
/// `channels`, `members`, `voice_states`, and `presences` are only ever
/// populated on the wire by a `GUILD_CREATE` dispatch — the platform
/// doesn't resend them on later fetches, so a reducer that wants this
/// state kept current has to track the narrower per-entity dispatches
/// (`CHANNEL_CREATE`/`GUILD_MEMBER_ADD`/... ) after the initial create.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Guild {
    pub id: GuildId,
    pub name: String,
    pub owner_id: UserId,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub emojis: Vec<Emoji>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub voice_states: Vec<VoiceState>,
    #[serde(default)]
    pub presences: Vec<Presence>,
}

#[cfg(test)]
mod tests {
    use super::{Guild, Role};
    use crate::{GuildId, RoleId, UserId};

    #[test]
    fn guild_round_trip_with_nested_roles() {
        let guild = Guild {
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
            features: vec!["COMMUNITY".into()],
            unavailable: false,
            channels: Vec::new(),
            members: Vec::new(),
            voice_states: Vec::new(),
            presences: Vec::new(),
        };

        let json = serde_json::to_string(&guild).unwrap();
        let decoded: Guild = serde_json::from_str(&json).unwrap();
        assert_eq!(guild, decoded);
    }
}
