//! # Subscription registry: event type → at most one handler.
//!
//! [`SubscriptionRegistry`] maps an event-type name to a single handler.
//! Registering a handler for a type that already has one **silently replaces**
//! it — last-writer-wins, not additive. UI code relies on the replace
//! semantics, so this is preserved exactly; multi-subscriber fan-out lives in
//! the alert callback registry instead.
//!
//! Handlers live in this map, not in the socket, so they survive reconnects by
//! construction: the manager re-issues only its own fixed join frames after a
//! reconnect, never caller subscriptions.
//!
//! ## Dispatch rules
//! - The handler registered for the envelope's type runs first.
//! - A handler registered under [`event_types::MESSAGE`] additionally receives
//!   **every** envelope regardless of type.
//! - No handler → the envelope is dropped silently.
//! - Handler panics are caught and reported; they never tear down dispatch.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use crate::events::{Envelope, describe_panic, event_types};

/// Handler invoked synchronously for each matching envelope.
pub type EventHandler = Arc<dyn Fn(&Envelope) + Send + Sync + 'static>;

/// Event-type → single-handler map with last-writer-wins registration.
#[derive(Default)]
pub struct SubscriptionRegistry {
    handlers: Mutex<HashMap<String, EventHandler>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `event`, replacing any existing handler.
    pub fn on(&self, event: impl Into<String>, handler: impl Fn(&Envelope) + Send + Sync + 'static) {
        let mut map = self.handlers.lock().expect("lock poisoned");
        map.insert(event.into(), Arc::new(handler));
    }

    /// Removes the handler for `event`. No-op when absent.
    pub fn off(&self, event: &str) {
        let mut map = self.handlers.lock().expect("lock poisoned");
        map.remove(event);
    }

    /// True if a handler is registered for `event`.
    pub fn has(&self, event: &str) -> bool {
        self.handlers.lock().expect("lock poisoned").contains_key(event)
    }

    /// Removes every handler (manager teardown).
    pub fn clear(&self) {
        self.handlers.lock().expect("lock poisoned").clear();
    }

    /// Dispatches one envelope synchronously on the calling task.
    ///
    /// Handlers are cloned out of the map before invocation, so a handler may
    /// re-register or remove subscriptions without deadlocking.
    ///
    /// Returns descriptions of any handler panics for telemetry.
    pub(crate) fn dispatch(&self, env: &Envelope) -> Vec<String> {
        let (typed, catch_all) = {
            let map = self.handlers.lock().expect("lock poisoned");
            let typed = map.get(&env.event).cloned();
            // Avoid double delivery when the envelope itself is "message".
            let catch_all = if env.event != event_types::MESSAGE {
                map.get(event_types::MESSAGE).cloned()
            } else {
                None
            };
            (typed, catch_all)
        };

        let mut panics = Vec::new();
        for handler in [typed, catch_all].into_iter().flatten() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handler(env))) {
                panics.push(describe_panic(payload));
            }
        }
        panics
    }
}
