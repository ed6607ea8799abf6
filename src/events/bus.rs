//! # Telemetry bus for broadcasting client events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking publishing from multiple sources (channel manager,
//! orchestrator, beacon controller).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                  Subscriber (one):
//!   ChannelManager ──┐
//!   Orchestrator   ──┼────► Bus ────► SubscriberSet listener ────► workers
//!   Beacon         ──┘  (broadcast)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls
//!   `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent events for all
//!   receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n`
//!   oldest items.
//! - **No persistence**: events are lost if there are no active subscribers at
//!   send time.

use tokio::sync::broadcast;

use super::telemetry::Telemetry;

/// Broadcast channel for telemetry events.
///
/// Thin wrapper over [`tokio::sync::broadcast`] that provides a
/// `publish`/`subscribe` API. Multiple publishers can publish concurrently;
/// subscribers receive clones of each event.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Telemetry>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// Capacity is shared across all receivers; the minimum is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Telemetry>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active subscribers.
    ///
    /// If there are no receivers, the event is dropped (this function still
    /// returns immediately).
    pub fn publish(&self, ev: Telemetry) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    ///
    /// - Each call creates an **independent** receiver.
    /// - A receiver only gets events **sent after** it subscribes.
    /// - Slow receivers get `RecvError::Lagged(n)` and skip over missed items.
    pub fn subscribe(&self) -> broadcast::Receiver<Telemetry> {
        self.tx.subscribe()
    }
}
