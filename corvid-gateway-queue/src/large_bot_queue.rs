use super::{day_limiter::DayLimiter, Queue};
use corvid_http::Client;
use std::{fmt::Debug, future::Future, pin::Pin, sync::Arc, time::Duration};
use tokio::{
    sync::{
        mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
        oneshot::{self, Sender},
    },
    time::sleep,
};

/// A [`Queue`] for bots placed in "Sharding for Very Large Bots", which
/// partitions identify requests across the server-advertised number of
/// concurrency buckets instead of a single 6-second-interval track.
///
/// Using this with other processes sharing the same bot will desynchronize
/// each process's view of the identify budget; coordinate across processes
/// instead if you need that.
#[derive(Debug)]
pub struct LargeBotQueue {
    buckets: Vec<UnboundedSender<Sender<()>>>,
    limiter: DayLimiter,
}

impl LargeBotQueue {
    /// Create a queue with the given number of concurrency buckets, as
    /// reported by `/gateway/bot`'s `session_start_limit.max_concurrency`.
    ///
    /// Returns `None` if the initial session-limit query fails.
    pub async fn new(buckets: usize, http: Arc<Client>) -> Option<Self> {
        let mut queues = Vec::with_capacity(buckets);

        for _ in 0..buckets {
            let (tx, rx) = unbounded_channel();

            tokio::spawn(waiter(rx));

            queues.push(tx);
        }

        let limiter = DayLimiter::new(http).await?;

        {
            let lock = limiter.0.lock().await;
            tracing::info!(
                current = lock.current,
                total = lock.total,
                "identify budget before next reset"
            );
        }

        Some(Self {
            buckets: queues,
            limiter,
        })
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

impl Queue for LargeBotQueue {
    fn request(&'_ self, shard_id: [u64; 2]) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        #[allow(clippy::cast_possible_truncation)]
        let bucket = (shard_id[0] % (self.buckets.len() as u64)) as usize;

        Box::pin(async move {
            self.limiter.get().await;

            let (tx, rx) = oneshot::channel();

            if let Err(source) = self.buckets[bucket].send(tx) {
                tracing::warn!("skipping, send failed: {source:?}");
                return;
            }

            tracing::debug!(shard = shard_id[0], "waiting for identify allowance");

            let _ = rx.await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::LargeBotQueue;
    use static_assertions::assert_impl_all;
    use std::fmt::Debug;

    assert_impl_all!(LargeBotQueue: Debug, Send, Sync);
}
