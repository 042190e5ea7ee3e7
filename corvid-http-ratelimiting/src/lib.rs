//! REST ratelimiting for the Corvid ecosystem.
//!
//! Implementations track two kinds of limits: a global, bot-wide limit, and
//! per-[`Path`] bucket limits. Callers report response headers back via a
//! [`TicketSender`] so the ratelimiter can learn a bucket's `limit` and
//! `remaining` count the first time it sees a route.
//!
//! A default in-memory implementation is provided in [`InMemoryRatelimiter`];
//! other backends (e.g. a shared store for a multi-process deployment) can
//! implement [`Ratelimiter`] directly.

pub mod headers;
pub mod in_memory;
pub mod request;
pub mod ticket;

pub use self::{
    headers::RatelimitHeaders,
    in_memory::InMemoryRatelimiter,
    request::{Method, Path},
};

use self::ticket::{TicketReceiver, TicketSender};
use futures_util::FutureExt;
use std::{
    error::Error,
    fmt::Debug,
    future::Future,
    pin::Pin,
    time::{Duration, Instant},
};

/// Ratelimit bucket state for a single [`Path`], as observed so far.
#[derive(Clone, Copy, Debug)]
pub struct Bucket {
    limit: u64,
    remaining: u64,
    reset_after: Duration,
    started_at: Option<Instant>,
}

impl Bucket {
    /// Total tickets allotted per cycle.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Tickets remaining in the current cycle.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Duration after [`Self::started_at`] at which the bucket refreshes.
    #[must_use]
    pub const fn reset_after(&self) -> Duration {
        self.reset_after
    }

    /// When the bucket's refresh countdown started, if it has.
    #[must_use]
    pub const fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// How long until the bucket refreshes, or `None` if it hasn't started
    /// counting down or has already refreshed.
    #[must_use]
    pub fn time_remaining(&self) -> Option<Duration> {
        let reset_at = self.started_at? + self.reset_after;

        reset_at.checked_duration_since(Instant::now())
    }
}

/// Type-erased error a [`Ratelimiter`] implementation may return.
pub type GenericError = Box<dyn Error + Send + Sync>;

/// Future returned by [`Ratelimiter::bucket`].
pub type GetBucketFuture =
    Pin<Box<dyn Future<Output = Result<Option<Bucket>, GenericError>> + Send + 'static>>;

/// Future returned by [`Ratelimiter::globally_locked`].
pub type IsGloballyLockedFuture =
    Pin<Box<dyn Future<Output = Result<bool, GenericError>> + Send + 'static>>;

/// Future returned by [`Ratelimiter::has`].
pub type HasBucketFuture =
    Pin<Box<dyn Future<Output = Result<bool, GenericError>> + Send + 'static>>;

/// Future returned by [`Ratelimiter::ticket`].
pub type GetTicketFuture =
    Pin<Box<dyn Future<Output = Result<TicketReceiver, GenericError>> + Send + 'static>>;

/// Future returned by [`Ratelimiter::wait_for_ticket`].
pub type WaitForTicketFuture =
    Pin<Box<dyn Future<Output = Result<TicketSender, GenericError>> + Send + 'static>>;

/// A backend tracking REST ratelimit state for an HTTP client.
///
/// All operations are asynchronous so implementations can use storage other
/// than process memory (for example, a store shared across processes).
pub trait Ratelimiter: Debug + Send + Sync {
    /// Retrieve the current bucket state for a path, if one is known yet.
    fn bucket(&self, path: &Path) -> GetBucketFuture;

    /// Whether a global (bot-wide) ratelimit is currently in effect.
    fn globally_locked(&self) -> IsGloballyLockedFuture;

    /// Whether a bucket exists yet for the given path.
    fn has(&self, path: &Path) -> HasBucketFuture;

    /// Request a ticket for a path. The returned [`TicketReceiver`] resolves
    /// once the ratelimiter grants a turn; tickets are granted in request
    /// order.
    fn ticket(&self, path: Path) -> GetTicketFuture;

    /// Convenience combinator: request a ticket and await its grant in one
    /// step.
    fn wait_for_ticket(&self, path: Path) -> WaitForTicketFuture {
        Box::pin(self.ticket(path).then(|maybe_rx| async move {
            match maybe_rx {
                Ok(rx) => rx.await.map_err(From::from),
                Err(e) => Err(e),
            }
        }))
    }
}
