//! # Telemetry events emitted by the channel, orchestrator and beacon.
//!
//! The [`TelemetryKind`] enum classifies events across four categories:
//! - **Connection events**: channel lifecycle (connecting, opened, lost, …)
//! - **Dispatch events**: emergency trigger and per-step outcomes
//! - **Beacon events**: watch lifecycle and sample errors
//! - **Isolation events**: a handler/callback/subscriber panicked or lagged
//!
//! The [`Telemetry`] struct carries additional metadata such as timestamps,
//! the alert id, step name, reasons, and reconnect attempt numbers.
//!
//! Dispatch-step failures are deliberately not surfaced to the end user
//! per-step; this stream is the aggregate record the UI and operators consume.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for telemetry ordering.
static TELEMETRY_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of telemetry events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryKind {
    // === Connection events ===
    /// A connection attempt is starting.
    ///
    /// Sets: `attempt` (0 for the explicit connect, 1-based for automatic
    /// reconnects), `at`, `seq`.
    Connecting,

    /// Handshake completed; join frames were re-sent.
    ///
    /// Sets: `attempt`, `at`, `seq`.
    ConnectionOpened,

    /// An attempt failed or an open connection dropped.
    ///
    /// Sets: `reason`, `attempt`, `at`, `seq`.
    ConnectionLost,

    /// An automatic reconnect was scheduled.
    ///
    /// Sets: `delay_ms`, `attempt` (the upcoming attempt number), `at`, `seq`.
    ReconnectScheduled,

    /// The reconnect cap was reached; the channel parks in `Disconnected`
    /// until an explicit `connect()`.
    ///
    /// Sets: `attempt` (the cap), `at`, `seq`.
    RetriesExhausted,

    /// The caller closed the channel; automatic reconnection is suppressed.
    ///
    /// Sets: `at`, `seq`.
    ConnectionClosed,

    /// `connect()` was called without a session credential; the channel stays
    /// `Disconnected`.
    ///
    /// Sets: `at`, `seq`.
    CredentialMissing,

    /// An outbound emit was dropped because the channel was not open.
    ///
    /// Sets: `event`, `at`, `seq`.
    EmitDropped,

    // === Dispatch events ===
    /// An emergency alert was created and dispatch is starting.
    ///
    /// Sets: `alert`, `at`, `seq`.
    AlertCreated,

    /// A dispatch step completed successfully.
    ///
    /// Sets: `alert`, `step`, `at`, `seq`.
    StepCompleted,

    /// A dispatch step failed; the remaining steps still run.
    ///
    /// Sets: `alert`, `step`, `reason`, `at`, `seq`.
    StepFailed,

    /// A conditional dispatch step did not apply.
    ///
    /// Sets: `alert`, `step`, `at`, `seq`.
    StepSkipped,

    /// An alert status transition was confirmed by the collaborator.
    ///
    /// Sets: `alert`, `reason` (new status label), `at`, `seq`.
    AlertUpdated,

    // === Beacon events ===
    /// A position watch started for an alert.
    ///
    /// Sets: `alert`, `at`, `seq`.
    BeaconStarted,

    /// A position watch was cancelled.
    ///
    /// Sets: `alert`, `at`, `seq`.
    BeaconStopped,

    /// A position sample failed while the watch was running.
    ///
    /// Sets: `alert`, `reason`, `at`, `seq`.
    BeaconSampleError,

    // === Isolation events ===
    /// A channel event handler panicked during dispatch.
    ///
    /// Sets: `event`, `reason`, `at`, `seq`.
    HandlerPanicked,

    /// A local alert callback panicked during fan-out.
    ///
    /// Sets: `reason`, `at`, `seq`.
    CallbackPanicked,

    /// A telemetry subscriber panicked while processing an event.
    ///
    /// Sets: `reason`, `at`, `seq`.
    SubscriberPanicked,

    /// A telemetry subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason`, `at`, `seq`.
    SubscriberOverflow,
}

/// Telemetry event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`TelemetryKind`]
#[derive(Clone, Debug)]
pub struct Telemetry {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: TelemetryKind,

    /// Alert id, if applicable.
    pub alert: Option<Arc<str>>,
    /// Dispatch step label, if applicable.
    pub step: Option<&'static str>,
    /// Channel event type name, if applicable.
    pub event: Option<Arc<str>>,
    /// Human-readable reason (errors, panic info, etc.).
    pub reason: Option<Arc<str>>,
    /// Reconnect attempt number (0 = explicit connect, 1-based automatic).
    pub attempt: Option<u32>,
    /// Reconnect delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
}

impl Telemetry {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: TelemetryKind) -> Self {
        Self {
            seq: TELEMETRY_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            alert: None,
            step: None,
            event: None,
            reason: None,
            attempt: None,
            delay_ms: None,
        }
    }

    /// Attaches an alert id.
    #[inline]
    pub fn with_alert(mut self, alert: impl Into<Arc<str>>) -> Self {
        self.alert = Some(alert.into());
        self
    }

    /// Attaches a dispatch step label.
    #[inline]
    pub fn with_step(mut self, step: &'static str) -> Self {
        self.step = Some(step);
        self
    }

    /// Attaches a channel event type name.
    #[inline]
    pub fn with_event(mut self, event: impl Into<Arc<str>>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a reconnect attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a reconnect delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Telemetry::new(TelemetryKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Telemetry::new(TelemetryKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Telemetry::new(TelemetryKind::Connecting);
        let b = Telemetry::new(TelemetryKind::ConnectionOpened);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_set_fields() {
        let ev = Telemetry::new(TelemetryKind::StepFailed)
            .with_alert("a1")
            .with_step("notify-contacts")
            .with_reason("timeout")
            .with_attempt(2)
            .with_delay(Duration::from_secs(3));
        assert_eq!(ev.alert.as_deref(), Some("a1"));
        assert_eq!(ev.step, Some("notify-contacts"));
        assert_eq!(ev.reason.as_deref(), Some("timeout"));
        assert_eq!(ev.attempt, Some(2));
        assert_eq!(ev.delay_ms, Some(3_000));
    }
}
