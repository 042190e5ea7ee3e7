mod bucket;

use self::bucket::{Bucket, BucketQueueTask};
use crate::{
    request::Path,
    ticket::{self, TicketNotifier},
    Bucket as InfoBucket, GetBucketFuture, GetTicketFuture, HasBucketFuture,
    IsGloballyLockedFuture, Ratelimiter,
};
use futures_util::future;
use std::{
    collections::hash_map::{Entry, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::sync::Mutex as AsyncMutex;

/// Global ratelimit lock, split into a fast-path flag and a mutex so that
/// the common case (no global ratelimit active) never has to wait on the
/// mutex at all.
#[derive(Debug, Default)]
pub(crate) struct GlobalLockPair {
    pub(crate) mutex: AsyncMutex<()>,
    flag: AtomicBool,
}

impl GlobalLockPair {
    pub(crate) fn lock(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub(crate) fn unlock(&self) {
        self.flag.store(false, Ordering::Release);
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// A [`Ratelimiter`] that keeps bucket state in process memory, spawning one
/// background task per bucket to pace outgoing requests.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRatelimiter {
    buckets: Arc<Mutex<HashMap<Path, Arc<Bucket>>>>,
    global: Arc<GlobalLockPair>,
}

impl InMemoryRatelimiter {
    /// Create a new, empty in-memory ratelimiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, path: Path, notifier: TicketNotifier) -> (Arc<Bucket>, bool) {
        let mut buckets = self.buckets.lock().expect("buckets poisoned");

        match buckets.entry(path.clone()) {
            Entry::Occupied(bucket) => {
                let bucket = bucket.into_mut();
                bucket.queue.push(notifier);

                (Arc::clone(bucket), false)
            }
            Entry::Vacant(entry) => {
                let bucket = Bucket::new(path);
                bucket.queue.push(notifier);

                let bucket = Arc::new(bucket);
                entry.insert(Arc::clone(&bucket));

                (bucket, true)
            }
        }
    }
}

impl Ratelimiter for InMemoryRatelimiter {
    fn bucket(&self, path: &Path) -> GetBucketFuture {
        if let Some(bucket) = self.buckets.lock().expect("buckets poisoned").get(path) {
            Box::pin(future::ok(Some(InfoBucket {
                limit: bucket.limit(),
                remaining: bucket.remaining(),
                reset_after: Duration::from_millis(bucket.reset_after()),
                started_at: bucket.started_at(),
            })))
        } else {
            Box::pin(future::ok(None))
        }
    }

    fn globally_locked(&self) -> IsGloballyLockedFuture {
        Box::pin(future::ok(self.global.is_locked()))
    }

    fn has(&self, path: &Path) -> HasBucketFuture {
        let has = self
            .buckets
            .lock()
            .expect("buckets poisoned")
            .contains_key(path);

        Box::pin(future::ok(has))
    }

    fn ticket(&self, path: Path) -> GetTicketFuture {
        let (notifier, receiver) = ticket::channel();
        let (bucket, fresh) = self.entry(path.clone(), notifier);

        if fresh {
            tokio::spawn(
                BucketQueueTask::new(
                    bucket,
                    Arc::clone(&self.buckets),
                    Arc::clone(&self.global),
                    path,
                )
                .run(),
            );
        }

        Box::pin(future::ok(receiver))
    }
}
