use super::GlobalLockPair;
use crate::{headers::RatelimitHeaders, request::Path, ticket::TicketNotifier};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex as SyncMutex,
    },
    time::{Duration, Instant},
};
use tokio::sync::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    Mutex as AsyncMutex,
};
use tokio::time::{sleep, timeout};

#[derive(Clone, Debug)]
pub enum TimeRemaining {
    Finished,
    NotStarted,
    Some(Duration),
}

#[derive(Debug)]
pub struct Bucket {
    pub limit: AtomicU64,
    pub path: Path,
    pub queue: BucketQueue,
    pub remaining: AtomicU64,
    pub reset_after: AtomicU64,
    pub started_at: SyncMutex<Option<Instant>>,
}

impl Bucket {
    pub fn new(path: Path) -> Self {
        Self {
            limit: AtomicU64::new(u64::MAX),
            path,
            queue: BucketQueue::default(),
            remaining: AtomicU64::new(u64::MAX),
            reset_after: AtomicU64::new(u64::MAX),
            started_at: SyncMutex::new(None),
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit.load(Ordering::Relaxed)
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Relaxed)
    }

    pub fn reset_after(&self) -> u64 {
        self.reset_after.load(Ordering::Relaxed)
    }

    pub fn started_at(&self) -> Option<Instant> {
        *self.started_at.lock().expect("bucket poisoned")
    }

    pub fn time_remaining(&self) -> TimeRemaining {
        let reset_after = self.reset_after();
        let started_at = match self.started_at() {
            Some(v) => v,
            None => return TimeRemaining::NotStarted,
        };
        let elapsed = started_at.elapsed();

        if elapsed > Duration::from_millis(reset_after) {
            return TimeRemaining::Finished;
        }

        TimeRemaining::Some(Duration::from_millis(reset_after) - elapsed)
    }

    pub fn try_reset(&self) -> bool {
        let mut started_at = self.started_at.lock().expect("bucket poisoned");

        if started_at.is_none() {
            return false;
        }

        if let TimeRemaining::Finished = self.time_remaining() {
            self.remaining.store(self.limit(), Ordering::Relaxed);
            *started_at = None;

            true
        } else {
            false
        }
    }

    pub fn update(&self, ratelimits: Option<(u64, u64, u64)>) {
        let bucket_limit = self.limit();

        {
            let mut started_at = self.started_at.lock().expect("bucket poisoned");

            if started_at.is_none() {
                started_at.replace(Instant::now());
            }
        }

        if let Some((limit, remaining, reset_after)) = ratelimits {
            if bucket_limit != limit && bucket_limit == u64::MAX {
                self.reset_after.store(reset_after, Ordering::SeqCst);
                self.limit.store(limit, Ordering::SeqCst);
            }

            self.remaining.store(remaining, Ordering::Relaxed);
        } else {
            self.remaining.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

/// FIFO queue of waiting tickets for a single bucket.
#[derive(Debug)]
pub struct BucketQueue {
    rx: AsyncMutex<UnboundedReceiver<TicketNotifier>>,
    tx: UnboundedSender<TicketNotifier>,
}

impl BucketQueue {
    pub fn push(&self, notifier: TicketNotifier) {
        let _ = self.tx.send(notifier);
    }

    pub async fn pop(&self, timeout_duration: Duration) -> Option<TicketNotifier> {
        let mut rx = self.rx.lock().await;

        timeout(timeout_duration, rx.recv()).await.ok().flatten()
    }
}

impl Default for BucketQueue {
    fn default() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            rx: AsyncMutex::new(rx),
            tx,
        }
    }
}

/// Background task draining a single bucket's queue, one ticket at a time,
/// pacing grants against the bucket's remaining/reset_after state and the
/// shared global lock.
pub(super) struct BucketQueueTask {
    bucket: Arc<Bucket>,
    buckets: Arc<SyncMutex<HashMap<Path, Arc<Bucket>>>>,
    global: Arc<GlobalLockPair>,
    path: Path,
}

impl BucketQueueTask {
    const WAIT: Duration = Duration::from_secs(10);

    pub fn new(
        bucket: Arc<Bucket>,
        buckets: Arc<SyncMutex<HashMap<Path, Arc<Bucket>>>>,
        global: Arc<GlobalLockPair>,
        path: Path,
    ) -> Self {
        Self {
            bucket,
            buckets,
            global,
            path,
        }
    }

    pub async fn run(self) {
        let span = tracing::debug_span!("bucket queue task", path = ?self.path);

        while let Some(notifier) = self.next().await {
            let Some(headers_rx) = notifier.available() else {
                // Consumer canceled before we could grant the ticket.
                continue;
            };

            tracing::debug!(parent: &span, "waiting for response headers");

            match timeout(Self::WAIT, headers_rx).await {
                Ok(Ok(Some(headers))) => self.handle_headers(&headers).await,
                Ok(Ok(None)) | Ok(Err(_)) | Err(_) => {
                    tracing::debug!(parent: &span, "no headers reported before timeout");
                }
            }
        }

        tracing::debug!(parent: &span, "queue drained, removing bucket");

        self.buckets
            .lock()
            .expect("buckets poisoned")
            .remove(&self.path);
    }

    async fn handle_headers(&self, headers: &RatelimitHeaders) {
        let ratelimits = match headers {
            RatelimitHeaders::GlobalLimited { retry_after } => {
                self.lock_global(*retry_after).await;
                None
            }
            RatelimitHeaders::None => return,
            RatelimitHeaders::Present(present) => Some((
                present.limit,
                present.remaining,
                (present.reset_after * 1000.0) as u64,
            )),
        };

        tracing::debug!(path = ?self.path, "updating bucket");
        self.bucket.update(ratelimits);
    }

    async fn lock_global(&self, retry_after_secs: f64) {
        tracing::debug!(path = ?self.path, "request was globally ratelimited");
        self.global.lock();
        let guard = self.global.mutex.lock().await;
        sleep(Duration::from_secs_f64(retry_after_secs.max(0.0))).await;
        self.global.unlock();
        drop(guard);
    }

    async fn next(&self) -> Option<TicketNotifier> {
        self.wait_if_needed().await;
        self.bucket.queue.pop(Self::WAIT).await
    }

    async fn wait_if_needed(&self) {
        let wait = {
            if self.bucket.remaining() > 0 {
                return;
            }

            match self.bucket.time_remaining() {
                TimeRemaining::Finished => {
                    self.bucket.try_reset();
                    return;
                }
                TimeRemaining::NotStarted => return,
                TimeRemaining::Some(dur) => dur,
            }
        };

        tracing::debug!(path = ?self.path, millis = %wait.as_millis(), "waiting for bucket to refresh");
        sleep(wait).await;
        self.bucket.try_reset();
    }
}
