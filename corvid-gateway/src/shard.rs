//! One logical gateway connection: handshake, heartbeat, identify/resume,
//! dispatch demultiplexing, and reconnection.

use crate::{
    compression::Inflater,
    error::{clears_session, is_fatal_close_code, Error, ErrorType, Result},
    heartbeat::{Heartbeater, Heartbeats, Latency},
    json,
    send_limiter::SendLimiter,
    stage::Stage,
    ShardId,
};
use corvid_gateway_queue::{LocalQueue, Queue};
use corvid_model::gateway::{
    event::{DispatchEvent, GatewayEvent},
    payload::{Identify, IdentifyProperties, Resume, UpdatePresencePayload},
    Intents,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::{
    sync::{
        atomic::{AtomicU16, AtomicU64, Ordering},
        Arc, Mutex as SyncMutex,
    },
    time::Duration,
};
use tokio::sync::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    oneshot, Mutex as AsyncMutex,
};
use tokio_tungstenite::tungstenite::{
    protocol::CloseFrame, Message as WsMessage,
};

/// Identifying information carried forward across a reconnect so the next
/// connection attempt can `Resume` instead of re-`Identify`ing.
#[derive(Clone, Debug, Default)]
pub struct ResumeSession {
    pub session_id: String,
    pub sequence: u64,
}

/// Signal a shard sends to whoever owns it (typically a [`Cluster`](crate::Cluster))
/// when its own reconnect loop cannot resolve the situation alone.
#[derive(Clone, Debug)]
pub enum Fault {
    /// Fatal auth/shape close code: this shard stops for good.
    Fatal(u16),
    /// Server asked for more shards (4011): the fleet must rescale.
    RescaleRequired,
}

/// Configuration for one [`Shard`], built with [`ConfigBuilder`].
#[derive(Clone)]
pub struct Config {
    token: String,
    intents: Intents,
    shard_id: ShardId,
    gateway_url: String,
    presence: Option<UpdatePresencePayload>,
    large_threshold: Option<u64>,
    queue: Arc<dyn Queue>,
}

impl Config {
    /// Start building a configuration for the given shard identity.
    #[must_use]
    pub fn builder(token: impl Into<String>, shard_id: ShardId, gateway_url: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(token, shard_id, gateway_url)
    }
}

/// Builder for [`Config`].
pub struct ConfigBuilder(Config);

impl ConfigBuilder {
    fn new(token: impl Into<String>, shard_id: ShardId, gateway_url: impl Into<String>) -> Self {
        Self(Config {
            token: token.into(),
            intents: Intents::empty(),
            shard_id,
            gateway_url: gateway_url.into(),
            presence: None,
            large_threshold: None,
            queue: Arc::new(LocalQueue::new()),
        })
    }

    /// Set the intents the shard identifies with.
    #[must_use]
    pub fn intents(mut self, intents: Intents) -> Self {
        self.0.intents = intents;
        self
    }

    /// Set the identify concurrency queue. Defaults to a [`LocalQueue`].
    #[must_use]
    pub fn queue(mut self, queue: Arc<dyn Queue>) -> Self {
        self.0.queue = queue;
        self
    }

    /// Set the initial presence sent on identify.
    #[must_use]
    pub fn presence(mut self, presence: UpdatePresencePayload) -> Self {
        self.0.presence = Some(presence);
        self
    }

    /// Set the `large_threshold` member-count cutoff.
    #[must_use]
    pub fn large_threshold(mut self, large_threshold: u64) -> Self {
        self.0.large_threshold = Some(large_threshold);
        self
    }

    /// Build the immutable [`Config`].
    #[must_use]
    pub fn build(self) -> Config {
        self.0
    }
}

#[derive(Debug)]
struct Session {
    stage: SyncMutex<Stage>,
    seq: Arc<AtomicU64>,
    id: SyncMutex<Option<String>>,
    heartbeats: Arc<Heartbeats>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            stage: SyncMutex::new(Stage::default()),
            seq: Arc::new(AtomicU64::new(0)),
            id: SyncMutex::new(None),
            heartbeats: Arc::new(Heartbeats::default()),
        }
    }
}

struct ShardRef {
    config: Config,
    session: Session,
    events_tx: UnboundedSender<DispatchEvent>,
    events_rx: AsyncMutex<Option<UnboundedReceiver<DispatchEvent>>>,
    outgoing_tx: AsyncMutex<Option<UnboundedSender<Vec<u8>>>>,
    shutdown_tx: AsyncMutex<Option<UnboundedSender<()>>>,
    fault_tx: Option<UnboundedSender<Fault>>,
    open_tx: AsyncMutex<Option<oneshot::Sender<std::result::Result<(), ErrorType>>>>,
}

/// One gateway session, driving its own connect/identify/resume/reconnect
/// lifecycle in a background task.
#[derive(Clone)]
pub struct Shard(Arc<ShardRef>);

impl Shard {
    /// Create a shard from configuration. Does not connect until
    /// [`start`](Self::start) is called.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_fault_channel(config, None)
    }

    pub(crate) fn with_fault_channel(config: Config, fault_tx: Option<UnboundedSender<Fault>>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self(Arc::new(ShardRef {
            config,
            session: Session::default(),
            events_tx,
            events_rx: AsyncMutex::new(Some(events_rx)),
            outgoing_tx: AsyncMutex::new(None),
            shutdown_tx: AsyncMutex::new(None),
            fault_tx,
            open_tx: AsyncMutex::new(None),
        }))
    }

    /// This shard's identity within its fleet.
    #[must_use]
    pub fn id(&self) -> ShardId {
        self.0.config.shard_id
    }

    /// Current connection stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        *self.0.session.stage.lock().unwrap()
    }

    /// Heartbeat latency information for this session.
    #[must_use]
    pub fn latency(&self) -> Latency {
        self.0.session.heartbeats.latency()
    }

    /// Take the receiving half of this shard's decoded dispatch events.
    ///
    /// Returns `None` if already taken.
    pub async fn events(&self) -> Option<UnboundedReceiver<DispatchEvent>> {
        self.0.events_rx.lock().await.take()
    }

    /// Serialize and send a command frame (e.g. a presence or voice state
    /// update) over the active connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the shard has no active connection or if `value`
    /// fails to serialize.
    pub async fn command(&self, op: u8, value: &impl Serialize) -> Result<()> {
        let bytes = frame(op, value).map_err(|source| {
            Error::new(ErrorType::Serializing, Some(Box::new(source)))
        })?;

        let guard = self.0.outgoing_tx.lock().await;
        let tx = guard.as_ref().ok_or_else(|| Error::new(ErrorType::Sending, None))?;
        tx.send(bytes)
            .map_err(|_| Error::new(ErrorType::Sending, None))
    }

    /// Start the shard's connection loop in the background.
    pub fn start(&self) {
        let shard = self.clone();
        tokio::spawn(async move { shard.run().await });
    }

    /// Start the shard and wait for its first WebSocket connection attempt
    /// to resolve, one way or the other. Does not wait for `Hello` or for a
    /// session to actually establish, only for the transport to connect.
    ///
    /// The background reconnect loop keeps running after this returns
    /// regardless of outcome, so a caller that gets `Err` back and doesn't
    /// want the shard retrying on its own must [`shutdown`](Self::shutdown)
    /// it.
    ///
    /// # Errors
    ///
    /// Returns the error the first connection attempt failed with.
    pub(crate) async fn open(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        *self.0.open_tx.lock().await = Some(tx);
        self.start();

        match rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(kind)) => Err(Error::new(kind, None)),
            Err(_) => Err(Error::new(ErrorType::Establishing, None)),
        }
    }

    /// Request a graceful shutdown. The running connection, if any, is
    /// closed with code 1000 and the loop exits without reconnecting.
    pub async fn shutdown(&self) {
        *self.0.session.stage.lock().unwrap() = Stage::Closing;

        if let Some(tx) = self.0.shutdown_tx.lock().await.take() {
            let _ = tx.send(());
        }
    }

    #[tracing::instrument(skip(self), fields(shard = %self.id()))]
    async fn run(&self) {
        let mut resume: Option<ResumeSession> = None;
        let mut backoff = Duration::from_secs(1);
        const MAX_BACKOFF: Duration = Duration::from_secs(900);
        let mut open_signal = self.0.open_tx.lock().await.take();

        loop {
            if self.stage() == Stage::Closing {
                *self.0.session.stage.lock().unwrap() = Stage::Disconnected;
                return;
            }

            let (shutdown_tx, mut shutdown_rx) = mpsc::unbounded_channel();
            *self.0.shutdown_tx.lock().await = Some(shutdown_tx);

            let result = self
                .connect_and_run(resume.clone(), &mut shutdown_rx, &mut open_signal)
                .await;

            match result {
                Ok(Outcome::Reconnect { resume: next, jitter_delay }) => {
                    resume = next;
                    backoff = Duration::from_secs(1);

                    if jitter_delay {
                        let wait = Duration::from_millis(1_000 + (rand::random::<f64>() * 4_000.0) as u64);
                        tracing::debug!(?wait, "invalid session, waiting before re-identifying");
                        tokio::time::sleep(wait).await;
                    }
                }
                Ok(Outcome::Shutdown) => {
                    *self.0.session.stage.lock().unwrap() = Stage::Disconnected;
                    return;
                }
                Ok(Outcome::RescaleRequired) => {
                    if let Some(tx) = &self.0.fault_tx {
                        let _ = tx.send(Fault::RescaleRequired);
                    }
                    *self.0.session.stage.lock().unwrap() = Stage::Disconnected;
                    return;
                }
                Err(error) => {
                    if let ErrorType::FatallyClosed { close_code } = error.kind() {
                        tracing::warn!(close_code, "shard fatally closed, not reconnecting");
                        if let Some(tx) = &self.0.fault_tx {
                            let _ = tx.send(Fault::Fatal(*close_code));
                        }
                        *self.0.session.stage.lock().unwrap() = Stage::Disconnected;
                        return;
                    }

                    tracing::warn!(%error, ?backoff, "connection attempt failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    }

    async fn connect_and_run(
        &self,
        resume: Option<ResumeSession>,
        shutdown_rx: &mut UnboundedReceiver<()>,
        open_signal: &mut Option<oneshot::Sender<std::result::Result<(), ErrorType>>>,
    ) -> Result<Outcome> {
        *self.0.session.stage.lock().unwrap() = Stage::Connecting;

        let url = format!(
            "{}?v={}&encoding=json&compress=zlib-stream",
            self.0.config.gateway_url,
            crate::API_VERSION
        );

        let connected = tokio::time::timeout(
            Duration::from_secs(60),
            tokio_tungstenite::connect_async(url),
        )
        .await
        .map_err(|_| Error::new(ErrorType::Establishing, None))
        .and_then(|result| {
            result.map_err(|source| Error::new(ErrorType::Establishing, Some(Box::new(source))))
        });

        // `open()` only cares whether the transport connected, not whether a
        // session was ever established on top of it — a caller waiting on
        // this signal shouldn't block on the server's handshake pacing.
        if let Some(tx) = open_signal.take() {
            let signal = match &connected {
                Ok(_) => Ok(()),
                Err(error) => Err(error.kind().clone()),
            };
            let _ = tx.send(signal);
        }

        let (socket, _response) = connected?;

        let (mut write, mut read) = socket.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        *self.0.outgoing_tx.lock().await = Some(outgoing_tx.clone());

        let close_code = Arc::new(AtomicU16::new(1000));
        let writer_close_code = Arc::clone(&close_code);

        let writer = tokio::spawn(async move {
            let limiter = SendLimiter::new();

            while let Some(bytes) = outgoing_rx.recv().await {
                limiter.acquire().await;

                if write.send(WsMessage::Binary(bytes)).await.is_err() {
                    break;
                }
            }

            let _ = write
                .send(WsMessage::Close(Some(CloseFrame {
                    code: writer_close_code.load(Ordering::Acquire).into(),
                    reason: "".into(),
                })))
                .await;
        });

        let mut inflater = Inflater::new(self.0.config.shard_id);
        let mut dead_rx: Option<UnboundedReceiver<()>> = None;
        let mut current_resume = resume;
        let mut hello_received = false;
        let hello_deadline = tokio::time::sleep(Duration::from_secs(60));
        tokio::pin!(hello_deadline);

        let outcome = loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    break Ok(Outcome::Shutdown);
                }
                () = &mut hello_deadline, if !hello_received => {
                    break Err(Error::new(ErrorType::Establishing, None));
                }
                Some(()) = async {
                    match &mut dead_rx {
                        Some(rx) => rx.recv().await,
                        None => std::future::pending().await,
                    }
                } => {
                    tracing::warn!("heartbeat starvation detected, reconnecting");
                    close_code.store(4000, Ordering::Release);
                    break Ok(Outcome::Reconnect { resume: current_resume, jitter_delay: false });
                }
                message = read.next() => {
                    match message {
                        None => break Ok(Outcome::Reconnect { resume: current_resume, jitter_delay: false }),
                        Some(Err(source)) => {
                            break Err(Error::new(ErrorType::Establishing, Some(Box::new(source))));
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            let code: u16 = frame.map_or(4000, |f| f.code.into());

                            if is_fatal_close_code(code) {
                                break Err(Error::new(ErrorType::FatallyClosed { close_code: code }, None));
                            }
                            if code == 4011 {
                                break Ok(Outcome::RescaleRequired);
                            }

                            let resume = if clears_session(code) { None } else { current_resume.clone() };
                            break Ok(Outcome::Reconnect { resume, jitter_delay: false });
                        }
                        Some(Ok(WsMessage::Binary(bytes))) => {
                            inflater.extend(&bytes);
                            if let Some(result) = self.process(&mut inflater, &outgoing_tx, &close_code, &mut dead_rx, &mut current_resume, &mut hello_received) {
                                break result;
                            }
                        }
                        Some(Ok(WsMessage::Text(text))) => {
                            if let Some(result) = self.process_bytes(text.as_bytes(), &outgoing_tx, &close_code, &mut dead_rx, &mut current_resume, &mut hello_received) {
                                break result;
                            }
                        }
                        Some(Ok(_)) => {}
                    }
                }
            }
        };

        drop(outgoing_tx);
        let _ = writer.await;

        outcome
    }

    fn process(
        &self,
        inflater: &mut Inflater,
        outgoing_tx: &UnboundedSender<Vec<u8>>,
        close_code: &Arc<AtomicU16>,
        dead_rx: &mut Option<UnboundedReceiver<()>>,
        current_resume: &mut Option<ResumeSession>,
        hello_received: &mut bool,
    ) -> Option<Result<Outcome>> {
        let owned = match inflater.msg() {
            Ok(Some(bytes)) => bytes.to_vec(),
            Ok(None) => return None,
            Err(source) => {
                return Some(Err(Error::new(ErrorType::Decompressing, Some(Box::new(source)))));
            }
        };
        inflater.clear();

        self.process_bytes(&owned, outgoing_tx, close_code, dead_rx, current_resume, hello_received)
    }

    fn process_bytes(
        &self,
        bytes: &[u8],
        outgoing_tx: &UnboundedSender<Vec<u8>>,
        close_code: &Arc<AtomicU16>,
        dead_rx: &mut Option<UnboundedReceiver<()>>,
        current_resume: &mut Option<ResumeSession>,
        hello_received: &mut bool,
    ) -> Option<Result<Outcome>> {
        let event = match json::parse(bytes) {
            Ok(event) => event,
            Err(source) => {
                tracing::warn!(%source, "failed to parse gateway frame, ignoring");
                return None;
            }
        };

        match event {
            GatewayEvent::Hello(hello) => {
                *hello_received = true;
                let interval = Duration::from_millis(hello.heartbeat_interval);
                let (dead_tx, rx) = mpsc::unbounded_channel();
                *dead_rx = Some(rx);

                let heartbeater = Heartbeater {
                    heartbeats: Arc::clone(&self.0.session.heartbeats),
                    interval,
                    seq: Arc::clone(&self.0.session.seq),
                    outgoing: outgoing_tx.clone(),
                    dead: dead_tx,
                };
                tokio::spawn(heartbeater.run());

                if let Some(resume_data) = current_resume.clone() {
                    *self.0.session.stage.lock().unwrap() = Stage::Resuming;
                    let payload = Resume {
                        token: self.0.config.token.clone(),
                        session_id: resume_data.session_id,
                        seq: resume_data.sequence,
                    };
                    if let Ok(bytes) = frame(6, &payload) {
                        let _ = outgoing_tx.send(bytes);
                    }
                } else {
                    *self.0.session.stage.lock().unwrap() = Stage::Identifying;
                    self.send_identify(outgoing_tx);
                }

                None
            }
            GatewayEvent::Dispatch(seq, dispatch) => {
                self.0.session.seq.store(seq, Ordering::Release);

                match &dispatch {
                    DispatchEvent::Ready(ready) => {
                        *self.0.session.id.lock().unwrap() = Some(ready.session_id.clone());
                        *self.0.session.stage.lock().unwrap() = Stage::Running;
                        *current_resume = Some(ResumeSession {
                            session_id: ready.session_id.clone(),
                            sequence: seq,
                        });
                    }
                    DispatchEvent::Resumed => {
                        *self.0.session.stage.lock().unwrap() = Stage::Running;
                    }
                    _ => {
                        if let Some(resume_data) = current_resume.as_mut() {
                            resume_data.sequence = seq;
                        }
                    }
                }

                let _ = self.0.events_tx.send(dispatch);
                None
            }
            GatewayEvent::Heartbeat(_) => {
                let seq = self.0.session.seq.load(Ordering::Acquire);
                let seq = if seq == 0 { None } else { Some(seq) };
                if let Ok(bytes) = frame(1, &seq) {
                    let _ = outgoing_tx.send(bytes);
                }
                None
            }
            GatewayEvent::HeartbeatAck => {
                self.0.session.heartbeats.record_ack();
                None
            }
            GatewayEvent::Reconnect => {
                close_code.store(4000, Ordering::Release);
                Some(Ok(Outcome::Reconnect {
                    resume: current_resume.clone(),
                    jitter_delay: false,
                }))
            }
            GatewayEvent::InvalidSession(resumable) => {
                if !resumable {
                    *current_resume = None;
                }
                close_code.store(4000, Ordering::Release);
                Some(Ok(Outcome::Reconnect {
                    resume: current_resume.clone(),
                    jitter_delay: true,
                }))
            }
        }
    }

    fn send_identify(&self, outgoing_tx: &UnboundedSender<Vec<u8>>) {
        let config = &self.0.config;
        let queue = Arc::clone(&config.queue);
        let shard_id = config.shard_id;
        let token = config.token.clone();
        let intents = config.intents;
        let presence = config.presence.clone();
        let large_threshold = config.large_threshold;
        let outgoing_tx = outgoing_tx.clone();

        tokio::spawn(async move {
            queue.request(shard_id.as_array()).await;

            let payload = Identify {
                token,
                intents,
                properties: IdentifyProperties::new("corvid", "corvid"),
                compress: Some(false),
                large_threshold,
                shard: shard_id.as_array(),
                presence,
            };

            if let Ok(bytes) = frame(2, &payload) {
                let _ = outgoing_tx.send(bytes);
            }
        });
    }
}

impl std::fmt::Debug for Shard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shard").field("id", &self.id()).finish()
    }
}

enum Outcome {
    Reconnect {
        resume: Option<ResumeSession>,
        /// Set for an `InvalidSession`-triggered reconnect, which waits a
        /// jittered 1-5s before re-identifying rather than reconnecting
        /// immediately.
        jitter_delay: bool,
    },
    RescaleRequired,
    Shutdown,
}

fn frame(op: u8, d: &impl Serialize) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&serde_json::json!({ "op": op, "d": d }))
}

#[cfg(test)]
mod tests {
    use super::{Config, Shard};
    use crate::{Intents, ShardId};
    use static_assertions::assert_impl_all;

    assert_impl_all!(Shard: Clone, Send, Sync);

    #[test]
    fn builder_defaults_to_empty_intents() {
        let config = Config::builder("token", ShardId::new(0, 1), "wss://gateway.example").build();
        let shard = Shard::new(config);
        assert_eq!(Intents::empty(), shard.0.config.intents);
    }
}
