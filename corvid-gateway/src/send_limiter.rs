//! Per-connection send rate limiter.
//!
//! The platform allows at most 120 outgoing frames per 60 seconds per
//! connection. Modeled as a continuously-refilling token bucket rather than
//! a fixed window, so a burst at the very start of a minute doesn't starve
//! the very next one.

use std::time::Duration;
use tokio::{
    sync::Mutex,
    time::{sleep, Instant},
};

const CAPACITY: u32 = 120;
const REFILL_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct State {
    tokens: f64,
    last_refill: Instant,
}

/// Continuously-refilling 120-per-60s token bucket guarding socket writes.
#[derive(Debug)]
pub(crate) struct SendLimiter(Mutex<State>);

impl SendLimiter {
    pub(crate) fn new() -> Self {
        Self(Mutex::new(State {
            tokens: f64::from(CAPACITY),
            last_refill: Instant::now(),
        }))
    }

    /// Wait until a send token is available, then consume one.
    pub(crate) async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.0.lock().await;
                let elapsed = state.last_refill.elapsed();
                let refill = elapsed.as_secs_f64() / REFILL_WINDOW.as_secs_f64() * f64::from(CAPACITY);
                state.tokens = (state.tokens + refill).min(f64::from(CAPACITY));
                state.last_refill = Instant::now();

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    let deficit = 1.0 - state.tokens;
                    Some(Duration::from_secs_f64(
                        deficit / f64::from(CAPACITY) * REFILL_WINDOW.as_secs_f64(),
                    ))
                }
            };

            match wait {
                None => return,
                Some(duration) => sleep(duration).await,
            }
        }
    }
}
