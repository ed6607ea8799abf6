//! # BeaconController: one position watch per active alert.
//!
//! Starts and stops continuous position sampling keyed by alert id. Every
//! sample is emitted back through the channel as a `location-update` event
//! tagged with the alert id; if the channel is not open the emit is dropped
//! there (losing one fix beats buffering them).
//!
//! ## Rules
//! - At most one [`BeaconHandle`] exists per alert id; `start` is idempotent.
//! - `stop` cancels the watch and removes the handle; no-op when absent.
//! - Watch-time sample errors become telemetry, never exceptions: the watch
//!   keeps running until explicitly stopped (no timeout-based cancellation).
//! - Handles live in the controller's session-scoped map; alert resolution
//!   stops the beacon via the orchestrator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::channel::ChannelManager;
use crate::config::Config;
use crate::error::BeaconError;
use crate::events::{Bus, Telemetry, TelemetryKind, event_types};

use super::source::{PositionSource, SampleFn, WatchErrorFn, WatchToken};

/// Active watch for one alert.
#[derive(Clone, Debug)]
pub struct BeaconHandle {
    /// Alert this beacon belongs to.
    pub alert_id: String,
    /// Token identifying the watch at the position source.
    pub watch_token: WatchToken,
}

/// Starts/stops per-alert position watches. Cheap to clone; clones share the
/// same handle map.
#[derive(Clone)]
pub struct BeaconController {
    inner: Arc<BeaconInner>,
}

struct BeaconInner {
    source: Arc<dyn PositionSource>,
    channel: ChannelManager,
    bus: Bus,
    config: Config,
    handles: Mutex<HashMap<String, BeaconHandle>>,
}

impl BeaconController {
    /// Creates a controller over the given position source, emitting samples
    /// through `channel`.
    pub fn new(
        source: Arc<dyn PositionSource>,
        channel: ChannelManager,
        config: Config,
        bus: Bus,
    ) -> Self {
        Self {
            inner: Arc::new(BeaconInner {
                source,
                channel,
                bus,
                config,
                handles: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Starts the beacon for `alert_id`. Idempotent: a second start while a
    /// watch is active is a no-op.
    pub fn start(&self, alert_id: &str) -> Result<(), BeaconError> {
        if self.is_active(alert_id) {
            debug!(alert = alert_id, "beacon already active");
            return Ok(());
        }

        let on_sample = self.sample_sink(alert_id);
        let on_error = self.error_sink(alert_id);
        let token = self
            .inner
            .source
            .watch(self.inner.config.watch_options(), on_sample, on_error)?;

        let mut handles = self.inner.handles.lock().expect("lock poisoned");
        if handles.contains_key(alert_id) {
            // Someone else won the race; keep their watch.
            drop(handles);
            self.inner.source.cancel(token);
            return Ok(());
        }
        handles.insert(
            alert_id.to_string(),
            BeaconHandle {
                alert_id: alert_id.to_string(),
                watch_token: token,
            },
        );
        drop(handles);

        self.inner
            .bus
            .publish(Telemetry::new(TelemetryKind::BeaconStarted).with_alert(alert_id));
        Ok(())
    }

    /// Stops the beacon for `alert_id`: cancels the watch and removes the
    /// stored handle. No-op when absent.
    pub fn stop(&self, alert_id: &str) {
        let handle = self
            .inner
            .handles
            .lock()
            .expect("lock poisoned")
            .remove(alert_id);
        if let Some(handle) = handle {
            self.inner.source.cancel(handle.watch_token);
            self.inner
                .bus
                .publish(Telemetry::new(TelemetryKind::BeaconStopped).with_alert(alert_id));
        }
    }

    /// True when a watch is active for `alert_id`.
    pub fn is_active(&self, alert_id: &str) -> bool {
        self.inner
            .handles
            .lock()
            .expect("lock poisoned")
            .contains_key(alert_id)
    }

    /// Emits each sample through the channel, tagged with the alert id.
    fn sample_sink(&self, alert_id: &str) -> SampleFn {
        let channel = self.inner.channel.clone();
        let alert_id = alert_id.to_string();
        Arc::new(move |sample| {
            let since_epoch = sample
                .at
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default();
            channel.emit(
                event_types::LOCATION_UPDATE,
                serde_json::json!({
                    "alertId": alert_id,
                    "lat": sample.lat,
                    "lng": sample.lng,
                    "accuracy": sample.accuracy,
                    "timestamp": since_epoch.as_millis() as u64,
                }),
            );
        })
    }

    /// Converts watch-time errors into telemetry; the watch keeps running.
    fn error_sink(&self, alert_id: &str) -> WatchErrorFn {
        let bus = self.inner.bus.clone();
        let alert_id = alert_id.to_string();
        Arc::new(move |err| {
            warn!(alert = %alert_id, error = %err, "position sample failed");
            bus.publish(
                Telemetry::new(TelemetryKind::BeaconSampleError)
                    .with_alert(alert_id.clone())
                    .with_reason(err.to_string()),
            );
        })
    }
}
