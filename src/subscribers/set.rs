//! # SubscriberSet: non-blocking fan-out over multiple telemetry subscribers.
//!
//! [`SubscriberSet`] distributes each [`Telemetry`](crate::events::Telemetry)
//! event to multiple subscribers **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Telemetry)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and logged (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow (events are dropped for that
//!   subscriber).
//!
//! ## Diagram
//! ```text
//!    emit(&Telemetry)
//!        │                         (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

use crate::events::{Bus, Telemetry, TelemetryKind, describe_panic};

use super::Subscribe;

/// Per-subscriber channel with metadata
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Telemetry>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// Isolation events (panic/overflow) are published back on `bus`, except
    /// when the offending event is itself an isolation event (no feedback
    /// loops).
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Telemetry>>(cap);
            let s = Arc::clone(&sub);
            let worker_bus = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = s.on_event(ev.as_ref());
                    if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = describe_panic(payload);
                        warn!(subscriber = s.name(), %info, "telemetry subscriber panicked");
                        if ev.kind != TelemetryKind::SubscriberPanicked {
                            worker_bus.publish(Telemetry::subscriber_panicked(s.name(), info));
                        }
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Subscribes to the bus and forwards every event to this set.
    ///
    /// Call once after construction; the listener exits when the bus is
    /// dropped. Lagged receivers skip the missed items and keep going.
    pub fn spawn_listener(self: &Arc<Self>, bus: &Bus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let set = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "telemetry listener lagged");
                        continue;
                    }
                }
            }
        })
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is dropped
    /// for it, a warning is logged and a `SubscriberOverflow` event is
    /// published (unless the dropped event was itself an overflow event).
    pub fn emit(&self, event: &Telemetry) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "queue_full",
                Err(mpsc::error::TrySendError::Closed(_)) => "worker_closed",
            };
            warn!(subscriber = channel.name, reason, "dropped telemetry event");
            if ev.kind != TelemetryKind::SubscriberOverflow {
                self.bus
                    .publish(Telemetry::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TelemetryKind;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    struct Recorder {
        seen: Mutex<Vec<TelemetryKind>>,
        notify: Notify,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Telemetry) {
            self.seen.lock().expect("lock poisoned").push(event.kind);
            self.notify.notify_one();
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Bomb {
        notify: Notify,
    }

    #[async_trait]
    impl Subscribe for Bomb {
        async fn on_event(&self, _event: &Telemetry) {
            self.notify.notify_one();
            panic!("subscriber exploded");
        }

        fn name(&self) -> &'static str {
            "bomb"
        }
    }

    #[tokio::test]
    async fn events_reach_subscriber_in_order() {
        let rec = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
            notify: Notify::new(),
        });
        let set = Arc::new(SubscriberSet::new(
            vec![rec.clone() as Arc<dyn Subscribe>],
            Bus::new(8),
        ));
        assert_eq!(set.len(), 1);

        set.emit(&Telemetry::new(TelemetryKind::Connecting));
        set.emit(&Telemetry::new(TelemetryKind::ConnectionOpened));
        rec.notify.notified().await;
        rec.notify.notified().await;

        let seen = rec.seen.lock().expect("lock poisoned").clone();
        assert_eq!(
            seen,
            vec![TelemetryKind::Connecting, TelemetryKind::ConnectionOpened]
        );
    }

    #[tokio::test]
    async fn subscriber_panic_becomes_telemetry() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let bomb = Arc::new(Bomb {
            notify: Notify::new(),
        });
        let set = SubscriberSet::new(vec![bomb.clone() as Arc<dyn Subscribe>], bus);

        set.emit(&Telemetry::new(TelemetryKind::Connecting));
        bomb.notify.notified().await;

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, TelemetryKind::SubscriberPanicked);
        let reason = ev.reason.as_deref().unwrap();
        assert!(reason.contains("bomb"));
        assert!(reason.contains("exploded"));
    }

    #[tokio::test]
    async fn shutdown_joins_workers() {
        let set = SubscriberSet::new(Vec::new(), Bus::new(8));
        assert!(set.is_empty());
        set.shutdown().await;
    }
}
