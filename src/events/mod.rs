//! Client events: wire envelopes, telemetry, and the broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to telemetry emitted by the channel manager, the
//! emergency orchestrator and the beacon controller.
//!
//! ## Contents
//! - [`Frame`], [`Envelope`], [`event_types`] — typed events on the channel
//! - [`TelemetryKind`], [`Telemetry`] — telemetry classification and metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `ChannelManager`, `Orchestrator`, `BeaconController`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `SubscriberSet::spawn_listener()` (fans out to telemetry
//!   subscribers such as `LogWriter`).

mod bus;
mod envelope;
mod telemetry;

pub use bus::Bus;
pub use envelope::{Envelope, Frame, event_types};
pub use telemetry::{Telemetry, TelemetryKind};

/// Renders a caught panic payload for telemetry.
///
/// Used by the dispatch and fan-out paths that isolate handler panics.
pub(crate) fn describe_panic(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
