use crate::{
    config::{Config, ResourceType},
    Cabinet,
};

/// Builder to configure and construct a [`Cabinet`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CabinetBuilder(Config);

impl CabinetBuilder {
    /// Start building with the default configuration (all resources, 100
    /// messages per channel).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict which resource kinds are stored. Defaults to all of them.
    #[must_use]
    pub fn resource_types(mut self, resource_types: ResourceType) -> Self {
        self.0.resource_types = resource_types;
        self
    }

    /// Set how many messages are retained per channel. Defaults to 100.
    #[must_use]
    pub fn message_cache_size(mut self, message_cache_size: usize) -> Self {
        self.0.message_cache_size = message_cache_size;
        self
    }

    /// Build the cabinet.
    #[must_use]
    pub fn build(self) -> Cabinet {
        Cabinet::with_config(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::CabinetBuilder;
    use static_assertions::assert_impl_all;
    use std::fmt::Debug;

    assert_impl_all!(CabinetBuilder: Clone, Debug, Default, Send, Sync);
}
