use corvid_http::Client;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::Mutex,
    time::{sleep_until, Instant},
};

/// Tracks the platform's daily identify budget (`session_start_limit`),
/// refreshing its view from `/gateway/bot` once exhausted.
#[derive(Debug)]
pub(crate) struct DayLimiter(pub(crate) Mutex<Inner>);

#[derive(Debug)]
pub(crate) struct Inner {
    http: Arc<Client>,
    pub(crate) next_reset: Instant,
    pub(crate) total: u64,
    pub(crate) current: u64,
}

impl DayLimiter {
    pub(crate) async fn new(http: Arc<Client>) -> Option<Self> {
        let info = http.gateway_bot().exec().await.ok()?;
        let limit = info.session_start_limit;

        let next_reset = Instant::now() + Duration::from_millis(limit.reset_after);
        let current = limit.total.saturating_sub(limit.remaining);

        Some(Self(Mutex::new(Inner {
            http,
            next_reset,
            total: limit.total,
            current,
        })))
    }

    pub(crate) async fn get(&self) {
        let mut lock = self.0.lock().await;

        if lock.current < lock.total {
            lock.current += 1;
            return;
        }

        let wait = lock.next_reset;
        sleep_until(wait).await;

        match lock.http.gateway_bot().exec().await {
            Ok(info) => {
                let limit = info.session_start_limit;
                lock.next_reset = Instant::now() + Duration::from_millis(limit.reset_after);
                lock.total = limit.total;
                lock.current = limit.total.saturating_sub(limit.remaining) + 1;
            }
            Err(source) => {
                tracing::warn!(
                    "unable to refresh session start limits, proceeding anyway: {source}"
                );
            }
        }
    }
}
