//! # ChannelManager: persistent event channel with capped reconnection.
//!
//! Owns one bidirectional connection to the remote event source, converts
//! inbound frames into [`Envelope`]s dispatched through the
//! [`SubscriptionRegistry`], and lets local producers emit outbound events.
//!
//! ## Lifecycle
//! ```text
//! connect() ──► Connecting ──handshake ok──► Open ──► serve(): pump frames
//!                   │                                    │
//!                   │ handshake failed/timeout           │ socket error/close
//!                   ▼                                    ▼
//!              Disconnected ◄────────────────────────────┘
//!                   │
//!                   │ attempts < cap: sleep(retry_interval) ──► Connecting
//!                   └─ attempts = cap: park until explicit connect()
//!
//! disconnect() ──► Closing ──► Disconnected  (reconnection suppressed)
//! ```
//!
//! ## Rules
//! - `connect()` is a no-op when `Connecting` or `Open`; without a session it
//!   logs and stays `Disconnected` (fire-and-forget, nothing raised).
//! - The retry interval is **fixed** (no growth); the attempt counter covers
//!   automatic reconnects since the last explicit `connect()` and is reset
//!   only by another explicit `connect()`.
//! - On every transition to Open the fixed join frames are re-sent exactly
//!   once: the remote side holds no memory of subscriptions across a drop.
//! - Inbound envelopes are dispatched synchronously, in arrival order, on the
//!   I/O task.
//! - `emit()` drops silently unless `Open`: losing a low-value telemetry emit
//!   beats unbounded client-side buffering.
//! - Transport errors never reach callers of `emit`/`on`; they become
//!   telemetry plus a state transition.
//! - `disconnect()` is honored even while a handshake is in flight: a
//!   handshake completing after cancellation is discarded, never opened.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::events::{Bus, Envelope, Frame, Telemetry, TelemetryKind, event_types};

use super::registry::SubscriptionRegistry;
use super::state::ConnectionState;
use super::transport::{Connection, Session, Transport};

/// Why one served connection ended.
enum ServeExit {
    /// The caller cancelled via `disconnect()`.
    Cancelled,
    /// The connection failed or the remote side closed.
    Lost(String),
}

/// Cancellation token for the current connection cycle.
///
/// The generation ties the token to the loop it was issued to, so a finished
/// loop can only release its own token and never one stored by a newer
/// explicit `connect()`.
struct CancelSlot {
    generation: u64,
    token: CancellationToken,
}

/// Handle to the persistent event channel.
///
/// Explicitly constructed and dependency-injected (process-wide lifetime is
/// the caller's choice); cloning is cheap and clones share the same channel.
#[derive(Clone)]
pub struct ChannelManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    transport: Arc<dyn Transport>,
    config: Config,
    bus: Bus,
    registry: SubscriptionRegistry,
    state: Mutex<ConnectionState>,
    session: Mutex<Option<Session>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<Frame>>>,
    /// Automatic reconnect attempts since the last explicit `connect()`.
    attempts: Mutex<u32>,
    cancel: Mutex<Option<CancelSlot>>,
    generations: AtomicU64,
}

impl ChannelManager {
    /// Creates a manager over the given transport. No connection is opened
    /// until [`connect`](Self::connect).
    pub fn new(transport: Arc<dyn Transport>, config: Config, bus: Bus) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                transport,
                config,
                bus,
                registry: SubscriptionRegistry::new(),
                state: Mutex::new(ConnectionState::Disconnected),
                session: Mutex::new(None),
                outbound: Mutex::new(None),
                attempts: Mutex::new(0),
                cancel: Mutex::new(None),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Sets the session identity used for the handshake and join frames.
    pub fn set_session(&self, session: Session) {
        *self.inner.session.lock().expect("lock poisoned") = Some(session);
    }

    /// Returns the current connection state (passive status indicator).
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock().expect("lock poisoned")
    }

    /// Opens the channel and arms automatic reconnection.
    ///
    /// Fire-and-forget: a no-op when already `Connecting`, `Open` or
    /// `Closing`; without a session it logs and stays `Disconnected`. An
    /// explicit call resets the reconnect-attempt counter.
    ///
    /// Must be called from within a tokio runtime (the I/O loop is spawned).
    pub fn connect(&self) {
        let session = match self.inner.session.lock().expect("lock poisoned").clone() {
            Some(s) => s,
            None => {
                warn!("connect() without session credential; staying disconnected");
                self.inner.bus.publish(Telemetry::new(TelemetryKind::CredentialMissing));
                return;
            }
        };

        {
            let mut state = self.inner.state.lock().expect("lock poisoned");
            match *state {
                ConnectionState::Connecting | ConnectionState::Open | ConnectionState::Closing => {
                    return;
                }
                ConnectionState::Disconnected => *state = ConnectionState::Connecting,
            }
        }

        *self.inner.attempts.lock().expect("lock poisoned") = 0;
        let cancel = CancellationToken::new();
        let generation = self.inner.generations.fetch_add(1, Ordering::SeqCst) + 1;
        *self.inner.cancel.lock().expect("lock poisoned") = Some(CancelSlot {
            generation,
            token: cancel.clone(),
        });

        let inner = Arc::clone(&self.inner);
        tokio::spawn(run_loop(inner, session, cancel, generation));
    }

    /// Closes the channel and suppresses automatic reconnection.
    ///
    /// Honored even while a handshake is in flight. Terminal for this
    /// connection cycle; a later explicit [`connect`](Self::connect) starts a
    /// fresh one.
    pub fn disconnect(&self) {
        let slot = self.inner.cancel.lock().expect("lock poisoned").take();
        if let Some(slot) = slot {
            *self.inner.state.lock().expect("lock poisoned") = ConnectionState::Closing;
            slot.token.cancel();
        }
    }

    /// Registers `handler` for `event`, replacing any existing handler
    /// (last-writer-wins). Handlers survive reconnects.
    pub fn on(&self, event: impl Into<String>, handler: impl Fn(&Envelope) + Send + Sync + 'static) {
        self.inner.registry.on(event, handler);
    }

    /// Removes the handler for `event`. No-op when absent.
    pub fn off(&self, event: &str) {
        self.inner.registry.off(event);
    }

    /// Emits an outbound event if the channel is `Open`; otherwise the call
    /// is dropped (no queuing across a disconnect).
    pub fn emit(&self, event: impl Into<String>, payload: serde_json::Value) {
        let event = event.into();
        if self.state() != ConnectionState::Open {
            debug!(%event, "emit dropped: channel not open");
            self.inner
                .bus
                .publish(Telemetry::new(TelemetryKind::EmitDropped).with_event(event));
            return;
        }
        if let Some(tx) = &*self.inner.outbound.lock().expect("lock poisoned") {
            let _ = tx.send(Frame::new(event, payload));
        }
    }
}

impl ManagerInner {
    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().expect("lock poisoned") = state;
    }

    /// Releases the cancel token of the loop identified by `generation`.
    ///
    /// A token stored by a newer explicit `connect()` is left in place, so a
    /// loop finishing late can never strip the fresh cycle of its token.
    fn release_cancel(&self, generation: u64) {
        let mut slot = self.cancel.lock().expect("lock poisoned");
        if slot.as_ref().is_some_and(|s| s.generation == generation) {
            slot.take();
        }
    }
}

/// Connection loop: handshake, serve, and fixed-interval capped reconnection.
async fn run_loop(
    inner: Arc<ManagerInner>,
    session: Session,
    cancel: CancellationToken,
    generation: u64,
) {
    let mut attempt: u32 = 0; // 0 = the explicit connect
    let mut first = true;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        if !first {
            // Automatic reconnect path, bounded by the attempt cap.
            let parked = {
                let mut attempts = inner.attempts.lock().expect("lock poisoned");
                if *attempts >= inner.config.max_reconnect_attempts {
                    true
                } else {
                    *attempts += 1;
                    attempt = *attempts;
                    false
                }
            };
            if parked {
                inner.set_state(ConnectionState::Disconnected);
                inner.bus.publish(
                    Telemetry::new(TelemetryKind::RetriesExhausted)
                        .with_attempt(inner.config.max_reconnect_attempts),
                );
                warn!(
                    cap = inner.config.max_reconnect_attempts,
                    "reconnect cap reached; waiting for explicit connect()"
                );
                inner.release_cancel(generation);
                return;
            }

            inner.bus.publish(
                Telemetry::new(TelemetryKind::ReconnectScheduled)
                    .with_delay(inner.config.retry_interval)
                    .with_attempt(attempt),
            );
            tokio::select! {
                _ = time::sleep(inner.config.retry_interval) => {}
                _ = cancel.cancelled() => break,
            }
            inner.set_state(ConnectionState::Connecting);
        }
        first = false;

        inner
            .bus
            .publish(Telemetry::new(TelemetryKind::Connecting).with_attempt(attempt));

        let handshake = time::timeout(
            inner.config.handshake_timeout,
            inner.transport.connect(&session.token),
        );
        let outcome = tokio::select! {
            res = handshake => res,
            _ = cancel.cancelled() => break,
        };
        match outcome {
            Ok(Ok(conn)) => {
                // Cancellation can land in the same poll as a completed
                // handshake; never open or replay joins after disconnect().
                if cancel.is_cancelled() {
                    break;
                }
                inner.set_state(ConnectionState::Open);
                inner
                    .bus
                    .publish(Telemetry::new(TelemetryKind::ConnectionOpened).with_attempt(attempt));

                let exit = serve(&inner, &session, conn, &cancel).await;
                inner.outbound.lock().expect("lock poisoned").take();

                match exit {
                    ServeExit::Cancelled => break,
                    ServeExit::Lost(reason) => {
                        warn!(%reason, "connection lost");
                        inner.set_state(ConnectionState::Disconnected);
                        inner.bus.publish(
                            Telemetry::new(TelemetryKind::ConnectionLost)
                                .with_reason(reason)
                                .with_attempt(attempt),
                        );
                    }
                }
            }
            Ok(Err(err)) => {
                debug!(error = %err, "handshake failed");
                inner.set_state(ConnectionState::Disconnected);
                inner.bus.publish(
                    Telemetry::new(TelemetryKind::ConnectionLost)
                        .with_reason(err.to_string())
                        .with_attempt(attempt),
                );
            }
            Err(_elapsed) => {
                let timeout = inner.config.handshake_timeout;
                debug!(?timeout, "handshake timed out");
                inner.set_state(ConnectionState::Disconnected);
                inner.bus.publish(
                    Telemetry::new(TelemetryKind::ConnectionLost)
                        .with_reason(format!("handshake timed out after {timeout:?}"))
                        .with_attempt(attempt),
                );
            }
        }
    }

    // Caller-initiated teardown.
    inner.set_state(ConnectionState::Disconnected);
    inner.outbound.lock().expect("lock poisoned").take();
    inner.release_cancel(generation);
    inner.bus.publish(Telemetry::new(TelemetryKind::ConnectionClosed));
}

/// Pumps one open connection: join replay, outbound writes, inbound dispatch.
async fn serve(
    inner: &Arc<ManagerInner>,
    session: &Session,
    mut conn: Box<dyn Connection>,
    cancel: &CancellationToken,
) -> ServeExit {
    // The remote side forgot everything on the previous drop; rejoin first.
    for frame in join_frames(session) {
        if let Err(err) = conn.send(frame).await {
            return ServeExit::Lost(err.to_string());
        }
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();
    *inner.outbound.lock().expect("lock poisoned") = Some(tx);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return ServeExit::Cancelled,
            out = rx.recv() => match out {
                Some(frame) => {
                    if let Err(err) = conn.send(frame).await {
                        return ServeExit::Lost(err.to_string());
                    }
                }
                // Sender lives in ManagerInner until serve() returns.
                None => return ServeExit::Lost("outbound channel closed".into()),
            },
            inbound = conn.recv() => match inbound {
                Ok(Some(frame)) => {
                    let env = Envelope::from_frame(frame);
                    let event = env.event.clone();
                    for panic_info in inner.registry.dispatch(&env) {
                        inner.bus.publish(
                            Telemetry::new(TelemetryKind::HandlerPanicked)
                                .with_event(event.clone())
                                .with_reason(panic_info),
                        );
                    }
                }
                Ok(None) => return ServeExit::Lost("closed by remote".into()),
                Err(err) => return ServeExit::Lost(err.to_string()),
            },
        }
    }
}

/// The fixed join frames re-issued on every (re)connect.
fn join_frames(session: &Session) -> [Frame; 2] {
    [
        Frame::new(
            event_types::JOIN_TRACKING_ROOM,
            serde_json::json!({ "touristId": session.tourist_id }),
        ),
        Frame::new(event_types::SUBSCRIBE_ALERTS, serde_json::json!({})),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// What one scripted handshake does.
    enum Script {
        Refuse,
        Accept { inbound: Vec<Frame>, hold_open: bool },
    }

    struct ScriptedTransport {
        script: Mutex<VecDeque<Script>>,
        connects: AtomicU32,
        sent: Arc<Mutex<Vec<Frame>>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                connects: AtomicU32::new(0),
                sent: Arc::new(Mutex::new(Vec::new())),
            })
        }

        fn connects(&self) -> u32 {
            self.connects.load(Ordering::SeqCst)
        }

        fn sent_events(&self) -> Vec<String> {
            self.sent
                .lock()
                .expect("lock poisoned")
                .iter()
                .map(|f| f.event.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn connect(&self, _credential: &str) -> Result<Box<dyn Connection>, TransportError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().expect("lock poisoned").pop_front() {
                Some(Script::Accept { inbound, hold_open }) => Ok(Box::new(ScriptedConn {
                    inbound: inbound.into(),
                    hold_open,
                    sent: Arc::clone(&self.sent),
                })),
                Some(Script::Refuse) | None => Err(TransportError::Handshake {
                    reason: "refused".into(),
                }),
            }
        }
    }

    struct ScriptedConn {
        inbound: VecDeque<Frame>,
        hold_open: bool,
        sent: Arc<Mutex<Vec<Frame>>>,
    }

    #[async_trait]
    impl Connection for ScriptedConn {
        async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
            self.sent.lock().expect("lock poisoned").push(frame);
            Ok(())
        }

        async fn recv(&mut self) -> Result<Option<Frame>, TransportError> {
            match self.inbound.pop_front() {
                Some(frame) => Ok(Some(frame)),
                None if self.hold_open => {
                    futures::future::pending::<()>().await;
                    unreachable!()
                }
                None => Err(TransportError::ConnectionLost {
                    reason: "dropped".into(),
                }),
            }
        }
    }

    fn manager(transport: Arc<ScriptedTransport>, config: Config) -> ChannelManager {
        let bus = Bus::new(config.bus_capacity_clamped());
        let mgr = ChannelManager::new(transport, config, bus);
        mgr.set_session(Session {
            token: "tok".into(),
            tourist_id: "t-1".into(),
        });
        mgr
    }

    fn fast_config(cap: u32) -> Config {
        Config {
            retry_interval: Duration::from_millis(100),
            max_reconnect_attempts: cap,
            handshake_timeout: Duration::from_secs(1),
            ..Config::default()
        }
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..1_000 {
            if cond() {
                return;
            }
            time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test(start_paused = true)]
    async fn connect_without_session_stays_disconnected() {
        let transport = ScriptedTransport::new(vec![]);
        let bus = Bus::new(8);
        let mgr = ChannelManager::new(transport.clone(), fast_config(5), bus);

        mgr.connect();
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
        assert_eq!(transport.connects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_opens_and_sends_join_frames() {
        let transport = ScriptedTransport::new(vec![Script::Accept {
            inbound: vec![],
            hold_open: true,
        }]);
        let mgr = manager(transport.clone(), fast_config(5));

        mgr.connect();
        {
            let mgr = mgr.clone();
            wait_until(move || mgr.state() == ConnectionState::Open).await;
        }
        assert_eq!(
            transport.sent_events(),
            vec!["join-tracking-room".to_string(), "subscribe-alerts".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn connect_is_noop_when_already_open() {
        let transport = ScriptedTransport::new(vec![Script::Accept {
            inbound: vec![],
            hold_open: true,
        }]);
        let mgr = manager(transport.clone(), fast_config(5));

        mgr.connect();
        {
            let mgr = mgr.clone();
            wait_until(move || mgr.state() == ConnectionState::Open).await;
        }
        mgr.connect();
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.connects(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_cap_parks_until_explicit_connect() {
        // Every handshake refused: 1 explicit + 5 automatic attempts, then park.
        let transport = ScriptedTransport::new(vec![]);
        let mgr = manager(transport.clone(), fast_config(5));

        mgr.connect();
        {
            let transport = transport.clone();
            wait_until(move || transport.connects() == 6).await;
        }
        {
            let mgr = mgr.clone();
            wait_until(move || mgr.state() == ConnectionState::Disconnected).await;
        }

        // Parked: no further attempts no matter how long we wait.
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.connects(), 6);

        // Explicit connect() resets the counter and tries again.
        mgr.connect();
        {
            let transport = transport.clone();
            wait_until(move || transport.connects() >= 7).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_drops_consume_exactly_the_cap() {
        // 10 connections that drop immediately; cap 5 means 1 explicit
        // + 5 automatic reconnects are observed, then the channel parks.
        let script = (0..10)
            .map(|_| Script::Accept {
                inbound: vec![],
                hold_open: false,
            })
            .collect();
        let transport = ScriptedTransport::new(script);
        let mgr = manager(transport.clone(), fast_config(5));

        mgr.connect();
        {
            let mgr = mgr.clone();
            let transport = transport.clone();
            wait_until(move || {
                transport.connects() == 6 && mgr.state() == ConnectionState::Disconnected
            })
            .await;
        }

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.connects(), 6);
        // Join frames were re-sent exactly once per (re)connect.
        let events = transport.sent_events();
        assert_eq!(events.len(), 12);
        for pair in events.chunks(2) {
            assert_eq!(pair, ["join-tracking-room", "subscribe-alerts"]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn inbound_frames_dispatch_in_arrival_order() {
        let transport = ScriptedTransport::new(vec![Script::Accept {
            inbound: vec![
                Frame::new("emergency-alert", serde_json::json!({"id": "a1"})),
                Frame::new("emergency-alert", serde_json::json!({"id": "a2"})),
            ],
            hold_open: true,
        }]);
        let mgr = manager(transport.clone(), fast_config(5));

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        mgr.on("emergency-alert", move |env| {
            let id = env.payload["id"].as_str().unwrap_or_default().to_string();
            sink.lock().expect("lock poisoned").push(id);
        });

        mgr.connect();
        {
            let seen = Arc::clone(&seen);
            wait_until(move || seen.lock().expect("lock poisoned").len() == 2).await;
        }
        assert_eq!(*seen.lock().expect("lock poisoned"), vec!["a1", "a2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn emit_delivers_when_open_and_drops_when_not() {
        let transport = ScriptedTransport::new(vec![Script::Accept {
            inbound: vec![],
            hold_open: true,
        }]);
        let mgr = manager(transport.clone(), fast_config(0));

        // Not connected yet: dropped.
        mgr.emit("location-update", serde_json::json!({"lat": 1.0}));
        assert!(transport.sent_events().is_empty());

        mgr.connect();
        {
            let mgr = mgr.clone();
            wait_until(move || mgr.state() == ConnectionState::Open).await;
        }
        mgr.emit("location-update", serde_json::json!({"lat": 2.0}));
        {
            let transport = transport.clone();
            wait_until(move || transport.sent_events().contains(&"location-update".to_string()))
                .await;
        }
    }

    /// Transport whose handshake blocks until the test releases it.
    struct GatedTransport {
        connects: AtomicU32,
        gate: tokio::sync::Notify,
        sent: Arc<Mutex<Vec<Frame>>>,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn connect(&self, _credential: &str) -> Result<Box<dyn Connection>, TransportError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(Box::new(ScriptedConn {
                inbound: VecDeque::new(),
                hold_open: true,
                sent: Arc::clone(&self.sent),
            }))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_during_handshake_never_opens_or_joins() {
        let transport = Arc::new(GatedTransport {
            connects: AtomicU32::new(0),
            gate: tokio::sync::Notify::new(),
            sent: Arc::new(Mutex::new(Vec::new())),
        });
        let config = Config {
            retry_interval: Duration::from_millis(100),
            max_reconnect_attempts: 5,
            handshake_timeout: Duration::from_secs(3600),
            ..Config::default()
        };
        let bus = Bus::new(8);
        let mgr = ChannelManager::new(transport.clone(), config, bus);
        mgr.set_session(Session {
            token: "tok".into(),
            tourist_id: "t-1".into(),
        });

        mgr.connect();
        {
            let transport = transport.clone();
            wait_until(move || transport.connects.load(Ordering::SeqCst) == 1).await;
        }

        // Disconnect while the handshake is still pending.
        mgr.disconnect();
        {
            let mgr = mgr.clone();
            wait_until(move || mgr.state() == ConnectionState::Disconnected).await;
        }

        // A late handshake completion must not resurrect the connection.
        transport.gate.notify_one();
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
        assert!(transport.sent.lock().expect("lock poisoned").is_empty());
        assert_eq!(transport.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn finished_loop_releases_only_its_own_cancel_token() {
        let transport = ScriptedTransport::new(vec![]);
        let mgr = manager(transport, fast_config(0));

        // A newer connect() stored generation 2; the old loop holds 1.
        let token = CancellationToken::new();
        *mgr.inner.cancel.lock().expect("lock poisoned") = Some(CancelSlot {
            generation: 2,
            token: token.clone(),
        });

        mgr.inner.release_cancel(1);
        assert!(mgr.inner.cancel.lock().expect("lock poisoned").is_some());

        mgr.inner.release_cancel(2);
        assert!(mgr.inner.cancel.lock().expect("lock poisoned").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_suppresses_reconnection() {
        let transport = ScriptedTransport::new(vec![Script::Accept {
            inbound: vec![],
            hold_open: true,
        }]);
        let mgr = manager(transport.clone(), fast_config(5));

        mgr.connect();
        {
            let mgr = mgr.clone();
            wait_until(move || mgr.state() == ConnectionState::Open).await;
        }
        mgr.disconnect();
        {
            let mgr = mgr.clone();
            wait_until(move || mgr.state() == ConnectionState::Disconnected).await;
        }
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.connects(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn handler_panic_is_reported_and_loop_survives() {
        let transport = ScriptedTransport::new(vec![Script::Accept {
            inbound: vec![
                Frame::new("emergency-alert", serde_json::json!({})),
                Frame::new("position", serde_json::json!({})),
            ],
            hold_open: true,
        }]);
        let config = fast_config(5);
        let bus = Bus::new(config.bus_capacity_clamped());
        let mut rx = bus.subscribe();
        let mgr = ChannelManager::new(transport.clone(), config, bus);
        mgr.set_session(Session {
            token: "tok".into(),
            tourist_id: "t-1".into(),
        });

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        mgr.on("emergency-alert", |_| panic!("boom"));
        let sink = Arc::clone(&seen);
        mgr.on("position", move |env| {
            sink.lock().expect("lock poisoned").push(env.event.clone());
        });

        mgr.connect();
        {
            let seen = Arc::clone(&seen);
            wait_until(move || !seen.lock().expect("lock poisoned").is_empty()).await;
        }
        // Still open after the panic, and telemetry recorded it.
        assert_eq!(mgr.state(), ConnectionState::Open);
        let mut saw_panic = false;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == TelemetryKind::HandlerPanicked {
                saw_panic = true;
                assert_eq!(ev.event.as_deref(), Some("emergency-alert"));
            }
        }
        assert!(saw_panic);
    }
}
