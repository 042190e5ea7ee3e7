//! Identify concurrency queueing.
//!
//! The platform limits how often a bot may start new gateway sessions; a
//! [`Queue`] serializes `Identify` attempts so a shard manager opening many
//! shards at once doesn't trip that limit. [`LocalQueue`] is the default,
//! in-process implementation; [`NoOpQueue`] is useful behind a proxy
//! gateway that already enforces the limit; [`LargeBotQueue`] (behind the
//! `large-bot-queue` feature) partitions requests into the
//! server-advertised number of concurrency buckets for very large bots.
//!
//! A custom [`Queue`] is required for multi-process clusters, where
//! requests from independent processes must still be serialized.

#[cfg(feature = "large-bot-queue")]
mod day_limiter;
#[cfg(feature = "large-bot-queue")]
mod large_bot_queue;

#[cfg(feature = "large-bot-queue")]
pub use large_bot_queue::LargeBotQueue;

use std::{
    fmt::Debug,
    future::{self, Future},
    pin::Pin,
    time::Duration,
};
use tokio::{
    sync::{
        mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
        oneshot::{self, Sender},
    },
    time::sleep,
};

/// Gate on a shard's ability to start a new gateway session.
pub trait Queue: Debug + Send + Sync {
    /// Request permission to identify. The returned future resolves only
    /// once the shard may send its `Identify` frame.
    fn request<'a>(&'a self, shard_id: [u64; 2]) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// An in-process [`Queue`] releasing one waiting request every 6 seconds.
///
/// Not suitable for clusters spread across multiple processes: independent
/// processes each running their own `LocalQueue` can still identify
/// concurrently with each other.
#[derive(Clone, Debug)]
pub struct LocalQueue(UnboundedSender<Sender<()>>);

impl Default for LocalQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalQueue {
    /// Create a new local queue, spawning its background releaser task.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded_channel();

        tokio::spawn(waiter(rx));

        Self(tx)
    }
}

async fn waiter(mut rx: UnboundedReceiver<Sender<()>>) {
    const DUR: Duration = Duration::from_secs(6);

    while let Some(req) = rx.recv().await {
        if let Err(source) = req.send(()) {
            tracing::warn!("skipping, send failed: {source:?}");
        }

        sleep(DUR).await;
    }
}

impl Queue for LocalQueue {
    fn request(&'_ self, [id, total]: [u64; 2]) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let (tx, rx) = oneshot::channel();

            if let Err(source) = self.0.send(tx) {
                tracing::warn!("skipping, send failed: {source:?}");
                return;
            }

            tracing::debug!(shard = id, total, "waiting for identify allowance");

            let _ = rx.await;
        })
    }
}

/// A [`Queue`] that admits every request instantly.
///
/// Appropriate behind a proxy gateway that already enforces identify
/// concurrency; using it directly against the real gateway will trip the
/// platform's ratelimit.
#[derive(Debug)]
pub struct NoOpQueue;

impl Queue for NoOpQueue {
    fn request(&'_ self, [_id, _total]: [u64; 2]) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(future::ready(()))
    }
}
