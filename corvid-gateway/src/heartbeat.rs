//! The heartbeat pacemaker: paces outgoing heartbeats and declares the
//! session dead when too many go unacknowledged.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
    time::{Duration, Instant},
};
use tokio::sync::mpsc::UnboundedSender;

/// Latency information about a shard's heartbeats, exposed via
/// [`Shard::info`](crate::Shard::info).
#[derive(Clone, Debug, Default)]
pub struct Latency {
    recent: VecDeque<Duration>,
}

impl Latency {
    /// Average round-trip time across the tracked recent heartbeats.
    #[must_use]
    pub fn average(&self) -> Option<Duration> {
        if self.recent.is_empty() {
            return None;
        }

        let total: Duration = self.recent.iter().sum();
        Some(total / u32::try_from(self.recent.len()).unwrap_or(1))
    }

    /// The most recent heartbeat round-trip times, oldest first, capped at 5.
    #[must_use]
    pub fn recent(&self) -> &VecDeque<Duration> {
        &self.recent
    }
}

/// Shared heartbeat timing state, read by the pacemaker and written to by
/// the frame reader on `HeartbeatAck`.
#[derive(Debug, Default)]
pub struct Heartbeats {
    last_sent: Mutex<Option<Instant>>,
    last_echoed: Mutex<Option<Instant>>,
    recent: Mutex<VecDeque<Duration>>,
}

impl Heartbeats {
    pub(crate) fn record_sent(&self) {
        *self.last_sent.lock().unwrap() = Some(Instant::now());
    }

    pub(crate) fn record_ack(&self) {
        let now = Instant::now();
        let sent = *self.last_sent.lock().unwrap();
        *self.last_echoed.lock().unwrap() = Some(now);

        if let Some(sent) = sent {
            let mut recent = self.recent.lock().unwrap();
            if recent.len() == 5 {
                recent.pop_front();
            }
            recent.push_back(now.saturating_duration_since(sent));
        }
    }

    /// Whether the pacemaker should declare the session dead: the gap
    /// between the last heartbeat sent and the last one echoed exceeds
    /// twice the negotiated interval.
    pub(crate) fn is_starved(&self, interval: Duration) -> bool {
        let sent = *self.last_sent.lock().unwrap();
        let echoed = *self.last_echoed.lock().unwrap();

        match (sent, echoed) {
            (Some(sent), Some(echoed)) if echoed >= sent => false,
            (Some(sent), _) => sent.elapsed() > interval.saturating_mul(2),
            (None, _) => false,
        }
    }

    pub(crate) fn latency(&self) -> Latency {
        Latency {
            recent: self.recent.lock().unwrap().clone(),
        }
    }
}

/// A gateway opcode frame serialized and ready to hand to the writer.
pub(crate) type OutgoingFrame = Vec<u8>;

/// Drives the heartbeat ticker for one session.
///
/// Ticks every `interval`, jittered on the very first tick by a uniform
/// random factor in `[0, 1)` so that many shards started together don't
/// all heartbeat in lockstep. Before every send it checks
/// [`Heartbeats::is_starved`]; if the session is starved it signals
/// `dead` and stops without sending.
pub(crate) struct Heartbeater {
    pub(crate) heartbeats: std::sync::Arc<Heartbeats>,
    pub(crate) interval: Duration,
    pub(crate) seq: std::sync::Arc<AtomicU64>,
    pub(crate) outgoing: UnboundedSender<OutgoingFrame>,
    pub(crate) dead: UnboundedSender<()>,
}

impl Heartbeater {
    pub(crate) async fn run(self) {
        let jitter = rand::random::<f64>();
        tokio::time::sleep(self.interval.mul_f64(jitter)).await;

        loop {
            if self.heartbeats.is_starved(self.interval) {
                tracing::warn!("heartbeat ack not received in time, session is dead");
                let _ = self.dead.send(());
                return;
            }

            let seq = self.seq.load(Ordering::Acquire);
            let seq = if seq == 0 { None } else { Some(seq) };
            let frame = serde_json::to_vec(&serde_json::json!({ "op": 1, "d": seq }))
                .expect("heartbeat frame always serializes");

            self.heartbeats.record_sent();

            if self.outgoing.send(frame).is_err() {
                return;
            }

            tracing::trace!(seq, "sent heartbeat");

            tokio::time::sleep(self.interval).await;
        }
    }
}
