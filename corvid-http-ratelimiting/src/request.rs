//! Route canonicalization: the path with numeric ids in non-major positions
//! normalized away, except for the first id of guild/channel/webhook
//! routes, which forms the bucket's "major parameter" and is kept verbatim
//! since the platform partitions its own buckets the same way.

pub use http::Method;

/// A canonicalized route: the key a [`crate::Ratelimiter`] buckets on.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Path {
    ChannelsId(u64),
    ChannelsIdInvites(u64),
    ChannelsIdMessages(u64),
    ChannelsIdMessagesBulkDelete(u64),
    ChannelsIdMessagesId(Method, u64),
    ChannelsIdMessagesIdReactions(u64),
    ChannelsIdMessagesIdReactionsUserIdType(u64),
    ChannelsIdPermissionsOverwriteId(u64),
    ChannelsIdPins(u64),
    ChannelsIdTyping(u64),
    ChannelsIdWebhooks(u64),
    Gateway,
    GatewayBot,
    Guilds,
    GuildsId(u64),
    GuildsIdAuditLogs(u64),
    GuildsIdBans(u64),
    GuildsIdBansId(u64),
    GuildsIdChannels(u64),
    GuildsIdEmojis(u64),
    GuildsIdEmojisId(u64),
    GuildsIdMembers(u64),
    GuildsIdMembersId(u64),
    GuildsIdMembersIdRolesId(u64),
    GuildsIdPrune(u64),
    GuildsIdRoles(u64),
    GuildsIdRolesId(u64),
    UsersId,
    UsersIdGuilds,
    WebhooksId(u64),
}

impl Path {
    /// The "major parameter" bucket id embedded in this path, if any.
    ///
    /// Two requests with the same variant but different major ids are
    /// different buckets: they never share a [`crate::Bucket`].
    #[must_use]
    pub const fn major_id(&self) -> Option<u64> {
        match self {
            Self::ChannelsId(id)
            | Self::ChannelsIdInvites(id)
            | Self::ChannelsIdMessages(id)
            | Self::ChannelsIdMessagesBulkDelete(id)
            | Self::ChannelsIdMessagesId(_, id)
            | Self::ChannelsIdMessagesIdReactions(id)
            | Self::ChannelsIdMessagesIdReactionsUserIdType(id)
            | Self::ChannelsIdPermissionsOverwriteId(id)
            | Self::ChannelsIdPins(id)
            | Self::ChannelsIdTyping(id)
            | Self::ChannelsIdWebhooks(id)
            | Self::GuildsId(id)
            | Self::GuildsIdAuditLogs(id)
            | Self::GuildsIdBans(id)
            | Self::GuildsIdBansId(id)
            | Self::GuildsIdChannels(id)
            | Self::GuildsIdEmojis(id)
            | Self::GuildsIdEmojisId(id)
            | Self::GuildsIdMembers(id)
            | Self::GuildsIdMembersId(id)
            | Self::GuildsIdMembersIdRolesId(id)
            | Self::GuildsIdPrune(id)
            | Self::GuildsIdRoles(id)
            | Self::GuildsIdRolesId(id)
            | Self::WebhooksId(id) => Some(*id),
            Self::Gateway
            | Self::GatewayBot
            | Self::Guilds
            | Self::UsersId
            | Self::UsersIdGuilds => None,
        }
    }
}

/// Construct the canonical [`Path`] for a channel-scoped message route.
///
/// This and its siblings below are the small set of route builders the
/// facade's REST client surface (corvid-http) needs; a full per-endpoint
/// builder table is out of scope.
#[must_use]
pub fn channel_messages(channel_id: u64) -> Path {
    Path::ChannelsIdMessages(channel_id)
}

#[must_use]
pub fn channel_message(method: Method, channel_id: u64) -> Path {
    Path::ChannelsIdMessagesId(method, channel_id)
}

#[must_use]
pub fn guild(guild_id: u64) -> Path {
    Path::GuildsId(guild_id)
}

#[must_use]
pub fn guild_member(guild_id: u64) -> Path {
    Path::GuildsIdMembersId(guild_id)
}
