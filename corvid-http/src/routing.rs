//! Request routes and their canonicalization into rate limit bucket
//! [`Path`]s.

use corvid_http_ratelimiting::request::{Method, Path};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A single REST route, carrying whatever path parameters it needs to build
/// both the concrete request URI and its canonical ratelimit bucket.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Route {
    CreateMessage { channel_id: u64 },
    GetGatewayBot,
    GetGuild { guild_id: u64 },
    GetMember { guild_id: u64, user_id: u64 },
}

impl Route {
    /// The HTTP method this route is sent with.
    #[must_use]
    pub const fn method(&self) -> Method {
        match self {
            Self::CreateMessage { .. } => Method::POST,
            Self::GetGatewayBot | Self::GetGuild { .. } | Self::GetMember { .. } => Method::GET,
        }
    }

    /// Whether this route requires the `Authorization` header.
    #[must_use]
    pub const fn requires_authorization(&self) -> bool {
        true
    }

    /// The canonical ratelimit bucket this route belongs to.
    #[must_use]
    pub fn path(&self) -> Path {
        match self {
            Self::CreateMessage { channel_id } => Path::ChannelsIdMessages(*channel_id),
            Self::GetGatewayBot => Path::GatewayBot,
            Self::GetGuild { guild_id } => Path::GuildsId(*guild_id),
            Self::GetMember { guild_id, .. } => Path::GuildsIdMembersId(*guild_id),
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::CreateMessage { channel_id } => {
                write!(f, "channels/{channel_id}/messages")
            }
            Self::GetGatewayBot => f.write_str("gateway/bot"),
            Self::GetGuild { guild_id } => write!(f, "guilds/{guild_id}"),
            Self::GetMember { guild_id, user_id } => {
                write!(f, "guilds/{guild_id}/members/{user_id}")
            }
        }
    }
}
