//! # Local alert callback registry.
//!
//! In-process publish point letting UI components observe "alert arrived"
//! without going through the channel again. Unlike the channel's subscription
//! registry this one is additive: every registered callback runs, in
//! registration order, and a panic in one is caught, reported as telemetry and
//! never prevents the remaining callbacks from running — the same failure
//! isolation the dispatch steps get.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::events::{Bus, Telemetry, TelemetryKind, describe_panic};

use super::alert::EmergencyAlert;

/// Identifier handed out by [`AlertCallbacks::add`]; pass it back to
/// [`AlertCallbacks::remove`] to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

type Callback = Arc<dyn Fn(&EmergencyAlert) + Send + Sync + 'static>;

struct Slots {
    next_id: u64,
    entries: Vec<(CallbackId, Callback)>,
}

/// Registration-ordered, panic-isolated alert fan-out.
pub struct AlertCallbacks {
    slots: Mutex<Slots>,
    bus: Bus,
}

impl AlertCallbacks {
    /// Creates an empty registry publishing isolation telemetry on `bus`.
    pub fn new(bus: Bus) -> Self {
        Self {
            slots: Mutex::new(Slots {
                next_id: 0,
                entries: Vec::new(),
            }),
            bus,
        }
    }

    /// Registers a callback; returns its id for later removal.
    pub fn add(&self, cb: impl Fn(&EmergencyAlert) + Send + Sync + 'static) -> CallbackId {
        let mut slots = self.slots.lock().expect("lock poisoned");
        let id = CallbackId(slots.next_id);
        slots.next_id += 1;
        slots.entries.push((id, Arc::new(cb)));
        id
    }

    /// Removes a callback. Returns false when the id is unknown.
    pub fn remove(&self, id: CallbackId) -> bool {
        let mut slots = self.slots.lock().expect("lock poisoned");
        let before = slots.entries.len();
        slots.entries.retain(|(entry_id, _)| *entry_id != id);
        slots.entries.len() != before
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.slots.lock().expect("lock poisoned").entries.len()
    }

    /// True when no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes every callback synchronously, in registration order.
    ///
    /// Callbacks are cloned out of the lock before invocation, so a callback
    /// may subscribe/unsubscribe without deadlocking. A panicking callback is
    /// reported and the remaining callbacks still run.
    pub fn notify(&self, alert: &EmergencyAlert) {
        let callbacks: Vec<Callback> = {
            let slots = self.slots.lock().expect("lock poisoned");
            slots.entries.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        for cb in callbacks {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| cb(alert))) {
                let info = describe_panic(payload);
                warn!(alert = %alert.id, %info, "alert callback panicked");
                self.bus.publish(
                    Telemetry::new(TelemetryKind::CallbackPanicked)
                        .with_alert(alert.id.clone())
                        .with_reason(info),
                );
            }
        }
    }
}
