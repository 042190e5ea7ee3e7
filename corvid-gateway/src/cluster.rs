//! [`Cluster`] manages a fleet of [`Shard`]s, partitioning guilds across
//! them and coordinating identify concurrency and rescales.

use crate::{
    shard::{Config as ShardConfig, Fault},
    DispatchEvent, Intents, Shard, ShardId,
};
use corvid_gateway_queue::{LargeBotQueue, LocalQueue, Queue};
use corvid_http::Client;
use corvid_model::gateway::payload::UpdatePresencePayload;
use dashmap::DashMap;
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    sync::Arc,
};
use tokio::sync::{mpsc, Mutex as AsyncMutex};

const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg";

/// How many shards to run and which range of indices this process owns.
#[derive(Clone, Debug)]
pub enum ShardScheme {
    /// Query the recommended shard count via `/gateway/bot` and run all of
    /// them, indices `0..shards`.
    Auto,
    /// Run a specific, contiguous range of shard indices out of `total`.
    Range {
        /// First shard index this process owns, inclusive.
        from: u64,
        /// Last shard index this process owns, inclusive.
        to: u64,
        /// Total shard count across the whole fleet (possibly spanning
        /// multiple processes).
        total: u64,
    },
}

/// Immutable, built configuration for a [`Cluster`].
pub struct Config {
    token: String,
    intents: Intents,
    scheme: ShardScheme,
    presence: Option<UpdatePresencePayload>,
    large_threshold: Option<u64>,
    http: Arc<Client>,
    gateway_url: String,
}

impl Config {
    /// Start building a configuration for the bot identified by `token`.
    #[must_use]
    pub fn builder(token: impl Into<String>, http: Arc<Client>) -> ConfigBuilder {
        ConfigBuilder::new(token, http)
    }
}

/// Builder for [`Config`].
pub struct ConfigBuilder(Config);

impl ConfigBuilder {
    fn new(token: impl Into<String>, http: Arc<Client>) -> Self {
        Self(Config {
            token: token.into(),
            intents: Intents::empty(),
            scheme: ShardScheme::Auto,
            presence: None,
            large_threshold: None,
            http,
            gateway_url: DEFAULT_GATEWAY_URL.to_owned(),
        })
    }

    /// Set the intents every shard identifies with.
    #[must_use]
    pub fn intents(mut self, intents: Intents) -> Self {
        self.0.intents = intents;
        self
    }

    /// Set how many shards to run and which indices this process owns.
    #[must_use]
    pub fn shard_scheme(mut self, scheme: ShardScheme) -> Self {
        self.0.scheme = scheme;
        self
    }

    /// Set the initial presence every shard identifies with.
    #[must_use]
    pub fn presence(mut self, presence: UpdatePresencePayload) -> Self {
        self.0.presence = Some(presence);
        self
    }

    /// Override the gateway URL. Defaults to the platform's stable
    /// WebSocket endpoint.
    #[must_use]
    pub fn gateway_url(mut self, url: impl Into<String>) -> Self {
        self.0.gateway_url = url.into();
        self
    }

    /// Build the immutable [`Config`].
    #[must_use]
    pub fn build(self) -> Config {
        self.0
    }
}

/// Starting a cluster failed.
#[derive(Debug)]
pub struct ClusterStartError {
    source: Box<dyn StdError + Send + Sync>,
}

impl Display for ClusterStartError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("retrieving the bot's gateway information failed")
    }
}

impl StdError for ClusterStartError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.source)
    }
}

struct ClusterRef {
    config: Config,
    shard_from: u64,
    shard_to: u64,
    shards: DashMap<u64, Shard>,
    events_rx: AsyncMutex<Option<mpsc::UnboundedReceiver<(u64, DispatchEvent)>>>,
    faults_rx: AsyncMutex<Option<mpsc::UnboundedReceiver<(u64, Fault)>>>,
}

/// A manager for multiple shards, owning their identify-concurrency
/// coordination and rescales. Cloning a `Cluster` points at the same
/// underlying fleet.
#[derive(Clone)]
pub struct Cluster(Arc<ClusterRef>);

impl Cluster {
    /// Build a cluster from configuration, resolving an `Auto` shard scheme
    /// via `/gateway/bot` but not connecting any shards yet.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterStartError`] if retrieving the gateway info over
    /// REST fails.
    pub async fn new(config: Config) -> Result<Self, ClusterStartError> {
        let (from, to, total, max_concurrency) = match &config.scheme {
            ShardScheme::Auto => {
                let info = config
                    .http
                    .gateway_bot()
                    .exec()
                    .await
                    .map_err(|source| ClusterStartError {
                        source: Box::new(source),
                    })?;

                (0, info.shards - 1, info.shards, info.session_start_limit.max_concurrency)
            }
            ShardScheme::Range { from, to, total } => (*from, *to, *total, 1),
        };

        let queue: Arc<dyn Queue> = if max_concurrency > 1 {
            match LargeBotQueue::new(max_concurrency as usize, Arc::clone(&config.http)).await {
                Some(queue) => Arc::new(queue),
                None => Arc::new(LocalQueue::new()),
            }
        } else {
            Arc::new(LocalQueue::new())
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (faults_tx, faults_rx) = mpsc::unbounded_channel();
        let shards = DashMap::new();

        for index in from..=to {
            let shard_config = ShardConfig::builder(
                config.token.clone(),
                ShardId::new(index, total),
                config.gateway_url.clone(),
            )
            .intents(config.intents);

            let shard_config = match &config.presence {
                Some(presence) => shard_config.presence(presence.clone()),
                None => shard_config,
            }
            .queue(Arc::clone(&queue))
            .build();

            let (fault_tx, mut fault_rx) = mpsc::unbounded_channel();
            let shard = Shard::with_fault_channel(shard_config, Some(fault_tx));

            let mut dispatch_rx = shard.events().await.expect("freshly created shard");
            let forward_tx = events_tx.clone();
            let shard_id = index;
            tokio::spawn(async move {
                while let Some(event) = dispatch_rx.recv().await {
                    if forward_tx.send((shard_id, event)).is_err() {
                        break;
                    }
                }
            });

            let forward_faults_tx = faults_tx.clone();
            tokio::spawn(async move {
                while let Some(fault) = fault_rx.recv().await {
                    match &fault {
                        Fault::Fatal(code) => {
                            tracing::error!(shard = shard_id, close_code = code, "shard closed fatally");
                        }
                        Fault::RescaleRequired => {
                            tracing::warn!(shard = shard_id, "server requested a rescale");
                        }
                    }

                    if forward_faults_tx.send((shard_id, fault)).is_err() {
                        break;
                    }
                }
            });

            shards.insert(index, shard);
        }

        Ok(Self(Arc::new(ClusterRef {
            config,
            shard_from: from,
            shard_to: to,
            shards,
            events_rx: AsyncMutex::new(Some(events_rx)),
            faults_rx: AsyncMutex::new(Some(faults_rx)),
        })))
    }

    /// Open every shard this process owns, one at a time.
    ///
    /// If any shard's first connection attempt fails, every shard already
    /// opened by this call is closed and the failing shard's error is
    /// returned; no shard is left running.
    ///
    /// # Errors
    ///
    /// Returns the first shard's connection error, if any.
    pub async fn up(&self) -> Result<(), crate::error::Error> {
        let mut opened = Vec::with_capacity(self.0.shards.len());

        for entry in &self.0.shards {
            let shard = entry.value().clone();

            if let Err(error) = shard.open().await {
                let rollback = opened.iter().map(|shard: &Shard| shard.shutdown());
                futures_util::future::join_all(rollback).await;
                return Err(error);
            }

            opened.push(shard);
        }

        Ok(())
    }

    /// Shut down every shard, in parallel.
    pub async fn down(&self) {
        let shutdowns = self
            .0
            .shards
            .iter()
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>()
            .into_iter()
            .map(|shard| async move { shard.shutdown().await });

        futures_util::future::join_all(shutdowns).await;
    }

    /// Look up a shard by index.
    #[must_use]
    pub fn shard(&self, id: u64) -> Option<Shard> {
        self.0.shards.get(&id).map(|entry| entry.value().clone())
    }

    /// Take the combined `(shard_id, event)` stream across every shard in
    /// the fleet. Returns `None` if already taken.
    pub async fn events(&self) -> Option<mpsc::UnboundedReceiver<(u64, DispatchEvent)>> {
        self.0.events_rx.lock().await.take()
    }

    /// Take the combined `(shard_id, fault)` stream across every shard in
    /// the fleet: fatal closes and rescale requests a caller may want to
    /// react to (e.g. by calling [`rescale`](Self::rescale)) instead of
    /// just the default logging. Returns `None` if already taken.
    pub async fn faults(&self) -> Option<mpsc::UnboundedReceiver<(u64, Fault)>> {
        self.0.faults_rx.lock().await.take()
    }

    /// The shard index responsible for `guild_id`, per `(guild_id >> 22)
    /// mod total`.
    #[must_use]
    pub fn shard_for(&self, guild_id: u64) -> u64 {
        let total = self.0.shard_to - self.0.shard_from + 1;
        (guild_id >> 22) % total
    }

    /// Re-query the recommended shard count, close every current shard, and
    /// open a fresh fleet sized to the new count.
    ///
    /// Per the contract, old shards are fully closed (the reducer must
    /// reset cabinet state) before new ones are opened.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterStartError`] if the REST query fails or if opening
    /// the new fleet fails.
    pub async fn rescale(&self) -> Result<Self, ClusterStartError> {
        self.down().await;

        let info = self
            .0
            .config
            .http
            .gateway_bot()
            .exec()
            .await
            .map_err(|source| ClusterStartError {
                source: Box::new(source),
            })?;

        let config = Config {
            token: self.0.config.token.clone(),
            intents: self.0.config.intents,
            scheme: ShardScheme::Range {
                from: 0,
                to: info.shards - 1,
                total: info.shards,
            },
            presence: self.0.config.presence.clone(),
            large_threshold: self.0.config.large_threshold,
            http: Arc::clone(&self.0.config.http),
            gateway_url: self.0.config.gateway_url.clone(),
        };

        let cluster = Self::new(config).await?;
        cluster.up().await.map_err(|source| ClusterStartError {
            source: Box::new(source),
        })?;
        Ok(cluster)
    }
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("shard_from", &self.0.shard_from)
            .field("shard_to", &self.0.shard_to)
            .finish()
    }
}
