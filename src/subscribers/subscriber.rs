//! # Telemetry subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging custom telemetry
//! handlers into the client.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as
//!   `TelemetryKind::SubscriberPanicked`)
//!
//! ## Rules
//! - A slow subscriber only affects its own queue.
//! - Queue overflow drops the event **for this subscriber only**; other
//!   subscribers are unaffected.
//! - Events are processed sequentially (FIFO) per subscriber.
//! - Subscribers do not block publishers or each other.

use async_trait::async_trait;

use crate::events::Telemetry;

/// Telemetry subscriber for client observability.
///
/// Each subscriber runs in isolation:
/// - **Bounded queue** buffers events (capacity via [`Self::queue_capacity`]).
/// - **Dedicated worker task** processes events sequentially (FIFO).
/// - **Panic isolation**: panics are caught and reported as
///   `SubscriberPanicked`.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
/// - Slow processing affects only this subscriber's queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single telemetry event.
    ///
    /// Called from a dedicated worker task, not in the publisher context.
    /// Events are delivered in FIFO order per subscriber.
    async fn on_event(&self, event: &Telemetry);

    /// Returns the subscriber name used in logs and overflow/panic events.
    ///
    /// Prefer short, descriptive names (e.g., "log", "metrics", "audit").
    /// The default uses `type_name::<Self>()`, which can be verbose —
    /// override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber.
    ///
    /// Overflow drops the new event for this subscriber only and reports
    /// `SubscriberOverflow`; the runtime clamps capacity to a minimum of 1.
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
