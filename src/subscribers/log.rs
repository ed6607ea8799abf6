//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] forwards telemetry to `tracing` in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [connecting] attempt=0
//! [opened] attempt=0
//! [connection-lost] reason="connection reset" attempt=1
//! [reconnect-scheduled] delay_ms=3000 attempt=1
//! [step-failed] alert=a-17 step=notify-contacts reason="timed out after 10s"
//! [beacon-started] alert=a-17
//! ```

use async_trait::async_trait;
use tracing::{info, warn};

use crate::events::{Telemetry, TelemetryKind};
use crate::subscribers::Subscribe;

/// Simple tracing-backed logging subscriber.
///
/// Enabled via the `logging` feature. Emits human-readable event descriptions
/// for debugging and demonstration purposes.
///
/// Not intended for production use — implement a custom [`Subscribe`] for
/// metrics collection or operator-facing audit trails.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Telemetry) {
        match e.kind {
            TelemetryKind::Connecting => {
                info!(attempt = ?e.attempt, "[connecting]");
            }
            TelemetryKind::ConnectionOpened => {
                info!(attempt = ?e.attempt, "[opened]");
            }
            TelemetryKind::ConnectionLost => {
                warn!(reason = ?e.reason, attempt = ?e.attempt, "[connection-lost]");
            }
            TelemetryKind::ReconnectScheduled => {
                info!(delay_ms = ?e.delay_ms, attempt = ?e.attempt, "[reconnect-scheduled]");
            }
            TelemetryKind::RetriesExhausted => {
                warn!(attempt = ?e.attempt, "[retries-exhausted]");
            }
            TelemetryKind::ConnectionClosed => {
                info!("[closed]");
            }
            TelemetryKind::CredentialMissing => {
                warn!("[credential-missing]");
            }
            TelemetryKind::EmitDropped => {
                info!(event = ?e.event, "[emit-dropped]");
            }
            TelemetryKind::AlertCreated => {
                info!(alert = ?e.alert, "[alert-created]");
            }
            TelemetryKind::StepCompleted => {
                info!(alert = ?e.alert, step = ?e.step, "[step-completed]");
            }
            TelemetryKind::StepFailed => {
                warn!(alert = ?e.alert, step = ?e.step, reason = ?e.reason, "[step-failed]");
            }
            TelemetryKind::StepSkipped => {
                info!(alert = ?e.alert, step = ?e.step, "[step-skipped]");
            }
            TelemetryKind::AlertUpdated => {
                info!(alert = ?e.alert, status = ?e.reason, "[alert-updated]");
            }
            TelemetryKind::BeaconStarted => {
                info!(alert = ?e.alert, "[beacon-started]");
            }
            TelemetryKind::BeaconStopped => {
                info!(alert = ?e.alert, "[beacon-stopped]");
            }
            TelemetryKind::BeaconSampleError => {
                warn!(alert = ?e.alert, reason = ?e.reason, "[beacon-sample-error]");
            }
            TelemetryKind::HandlerPanicked => {
                warn!(event = ?e.event, reason = ?e.reason, "[handler-panicked]");
            }
            TelemetryKind::CallbackPanicked => {
                warn!(reason = ?e.reason, "[callback-panicked]");
            }
            TelemetryKind::SubscriberPanicked => {
                warn!(reason = ?e.reason, "[subscriber-panicked]");
            }
            TelemetryKind::SubscriberOverflow => {
                warn!(reason = ?e.reason, "[subscriber-overflow]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
