//! Wiring for a complete bot.
//!
//! The component crates (gateway, REST, cache, handler registry, webhook
//! receiver) are independently usable; this crate exists because most bots
//! want the same control flow over them: [`Bot`] owns a REST client, a
//! shard fleet, a cache, and a handler registry, and [`Bot::run`] drives
//! events from the fleet through the sequence the rest of the ecosystem
//! assumes — synchronous pre-handlers, then the cache update, then async
//! post-handlers.
//!
//! A bot that needs finer control can skip [`Bot`] entirely and wire the
//! component crates together directly; nothing here is required to use
//! them.

pub use corvid_cache_inmemory as cache;
pub use corvid_gateway as gateway;
pub use corvid_gateway_queue as gateway_queue;
pub use corvid_handler as handler;
pub use corvid_http as http;
pub use corvid_http_ratelimiting as http_ratelimiting;
pub use corvid_model as model;
pub use corvid_webhook as webhook;

use corvid_cache_inmemory::{Cabinet, CabinetBuilder};
use corvid_gateway::{
    Cluster, ClusterConfig, ClusterStartError, Error as GatewayError, Intents, ShardScheme,
};
use corvid_handler::Handlers;
use corvid_http::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Builds a [`Bot`].
pub struct BotBuilder {
    token: String,
    intents: Intents,
    shard_scheme: ShardScheme,
    cabinet: CabinetBuilder,
    http: Option<Arc<Client>>,
}

impl BotBuilder {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            intents: Intents::empty(),
            shard_scheme: ShardScheme::Auto,
            cabinet: Cabinet::builder(),
            http: None,
        }
    }

    /// Set the gateway intents every shard identifies with.
    #[must_use]
    pub fn intents(mut self, intents: Intents) -> Self {
        self.intents = intents;
        self
    }

    /// Set how many shards to run and which indices this process owns.
    /// Defaults to [`ShardScheme::Auto`].
    #[must_use]
    pub fn shard_scheme(mut self, scheme: ShardScheme) -> Self {
        self.shard_scheme = scheme;
        self
    }

    /// Configure the cabinet, e.g. to restrict which resources are cached.
    #[must_use]
    pub fn cabinet(mut self, cabinet: CabinetBuilder) -> Self {
        self.cabinet = cabinet;
        self
    }

    /// Use a pre-built REST client instead of one constructed from the
    /// token. Useful for routing through a proxy.
    #[must_use]
    pub fn http(mut self, http: Arc<Client>) -> Self {
        self.http = Some(http);
        self
    }

    /// Resolves the shard scheme (querying `/gateway/bot` if [`Auto`]),
    /// then builds the cabinet and handler registry. Doesn't start any
    /// shards; call [`Bot::up`] for that.
    ///
    /// [`Auto`]: ShardScheme::Auto
    ///
    /// # Errors
    ///
    /// Returns [`ClusterStartError`] if retrieving the bot's gateway
    /// information over REST fails.
    pub async fn build(self) -> Result<Bot, ClusterStartError> {
        let http = self
            .http
            .unwrap_or_else(|| Arc::new(Client::new(self.token.clone())));

        let cluster_config = ClusterConfig::builder(self.token, Arc::clone(&http))
            .intents(self.intents)
            .shard_scheme(self.shard_scheme)
            .build();

        let cluster = Cluster::new(cluster_config).await?;

        Ok(Bot {
            http,
            cluster,
            cabinet: Arc::new(self.cabinet.build()),
            handlers: Arc::new(Handlers::new()),
        })
    }
}

/// A REST client, shard fleet, cache, and handler registry wired together.
///
/// Cheap to clone: every field is itself reference-counted or cloneable
/// cheaply, the same way [`Cluster`] and [`Client`] are.
#[derive(Clone)]
pub struct Bot {
    http: Arc<Client>,
    cluster: Cluster,
    cabinet: Arc<Cabinet>,
    handlers: Arc<Handlers>,
}

impl Bot {
    /// Start building a bot for the application identified by `token`.
    #[must_use]
    pub fn builder(token: impl Into<String>) -> BotBuilder {
        BotBuilder::new(token)
    }

    /// The REST client.
    #[must_use]
    pub fn http(&self) -> &Arc<Client> {
        &self.http
    }

    /// The shard fleet.
    #[must_use]
    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// The in-memory cache kept coherent by [`Bot::run`].
    #[must_use]
    pub fn cabinet(&self) -> &Arc<Cabinet> {
        &self.cabinet
    }

    /// The typed handler registry [`Bot::run`] dispatches into.
    #[must_use]
    pub fn handlers(&self) -> &Arc<Handlers> {
        &self.handlers
    }

    /// Start every shard this process owns.
    ///
    /// # Errors
    ///
    /// Returns the first shard's connection error if any shard failed to
    /// open; shards that did open are closed before returning.
    pub async fn up(&self) -> Result<(), GatewayError> {
        self.cluster.up().await
    }

    /// Shut down every shard.
    pub async fn down(&self) {
        self.cluster.down().await;
    }

    /// Spawn the dispatch loop: each event off the shard fleet runs
    /// synchronous pre-handlers, updates the cabinet, then runs async
    /// post-handlers, in that order.
    ///
    /// Returns `None` if the fleet's event stream was already taken (by a
    /// prior call to this or to [`Cluster::events`] directly); call this at
    /// most once per bot.
    pub async fn run(&self) -> Option<JoinHandle<()>> {
        let mut events = self.cluster.events().await?;
        let cabinet = Arc::clone(&self.cabinet);
        let handlers = Arc::clone(&self.handlers);

        Some(tokio::spawn(async move {
            while let Some((shard_id, event)) = events.recv().await {
                trace!(shard_id, "dispatching event");
                handlers.dispatch_pre_event(&event);
                cabinet.update(&event);
                handlers.dispatch_post_event(event);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{Bot, BotBuilder};
    use static_assertions::assert_impl_all;

    assert_impl_all!(Bot: Clone, Send, Sync);
    assert_impl_all!(BotBuilder: Send, Sync);
}
