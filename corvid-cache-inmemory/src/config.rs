use bitflags::bitflags;

bitflags! {
    /// Which resource kinds a [`Cabinet`](crate::Cabinet) actually stores.
    ///
    /// Specifying `CHANNEL` but not `MESSAGE` caches channel creates/updates/
    /// deletes but ignores message dispatches entirely.
    pub struct ResourceType: u64 {
        const CHANNEL = 1;
        const EMOJI = 1 << 1;
        const GUILD = 1 << 2;
        const MEMBER = 1 << 3;
        const MESSAGE = 1 << 4;
        const PRESENCE = 1 << 5;
        const ROLE = 1 << 6;
        const USER = 1 << 7;
        const VOICE_STATE = 1 << 8;
    }
}

/// Configuration for a [`Cabinet`](crate::Cabinet).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub(crate) resource_types: ResourceType,
    pub(crate) message_cache_size: usize,
}

impl Config {
    /// Which resources are currently configured to be cached.
    #[must_use]
    pub const fn resource_types(&self) -> ResourceType {
        self.resource_types
    }

    /// Maximum number of messages retained per channel.
    #[must_use]
    pub const fn message_cache_size(&self) -> usize {
        self.message_cache_size
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resource_types: ResourceType::all(),
            message_cache_size: 100,
        }
    }
}
