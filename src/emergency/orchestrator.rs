//! # Orchestrator: fan one emergency trigger out to independent dispatch steps.
//!
//! [`Orchestrator::trigger`] creates the alert record, then executes the six
//! dispatch steps **in order**, each wrapped so that a collaborator failure or
//! timeout is caught, logged with the step name and recorded — and execution
//! proceeds to the next step unconditionally. A failed incident-report
//! generation must never prevent contacting emergency services.
//!
//! ## Step order
//! ```text
//! trigger(kind, severity, message, location)
//!   └─► create_alert (failure propagates: nothing to dispatch without it)
//!        ├─► 1. broadcast            emit("emergency-alert")
//!        ├─► 2. notify-contacts      EmergencyApi::notify_contacts
//!        ├─► 3. notify-services      EmergencyApi::notify_emergency_services
//!        ├─► 4. incident-report      only if kind==CRIME or severity==CRITICAL
//!        ├─► 5. start-beacon         BeaconController::start(alert_id)
//!        └─► 6. notify-nearby        EmergencyApi::notify_nearby_operators (5 km)
//!   └─► local callback fan-out ─► DispatchReport { alert, 6 step reports }
//! ```
//!
//! ## Rules
//! - Steps run sequentially; each outcome is known before the next begins.
//! - No step's success is a precondition for another's execution.
//! - No automatic retry of a failed step; retry is a manual re-trigger.
//! - acknowledge/resolve are direct user actions: their errors **propagate**
//!   so the UI can retry, and the client enforces monotonic status
//!   transitions on its working copy.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tokio::time;
use tracing::warn;

use crate::beacon::BeaconController;
use crate::channel::ChannelManager;
use crate::config::Config;
use crate::error::{ApiError, DispatchError};
use crate::events::{Bus, Telemetry, TelemetryKind, event_types};

use super::alert::{AlertKind, AlertStatus, EmergencyAlert, GeoPoint, Severity};
use super::api::{EmergencyApi, TouristProfile};
use super::callbacks::{AlertCallbacks, CallbackId};
use super::report::{DispatchReport, DispatchStep, StepOutcome, StepReport};

/// Emergency protocol orchestrator.
///
/// Explicitly constructed and dependency-injected; cloning is cheap and
/// clones share the same working-copy store and callback registry.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<OrchestratorInner>,
}

struct OrchestratorInner {
    api: Arc<dyn EmergencyApi>,
    channel: ChannelManager,
    beacon: BeaconController,
    callbacks: AlertCallbacks,
    bus: Bus,
    config: Config,
    profile: TouristProfile,
    /// Working copies of alerts this client has seen (server is the record).
    alerts: Mutex<HashMap<String, EmergencyAlert>>,
}

impl Orchestrator {
    /// Creates an orchestrator over the injected collaborators.
    pub fn new(
        api: Arc<dyn EmergencyApi>,
        channel: ChannelManager,
        beacon: BeaconController,
        profile: TouristProfile,
        config: Config,
        bus: Bus,
    ) -> Self {
        Self {
            inner: Arc::new(OrchestratorInner {
                api,
                channel,
                beacon,
                callbacks: AlertCallbacks::new(bus.clone()),
                bus,
                config,
                profile,
                alerts: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Installs the channel subscription that feeds inbound alerts into the
    /// local callback fan-out. Call once after construction.
    pub fn bind_channel(&self) {
        let me = self.clone();
        self.inner
            .channel
            .on(event_types::EMERGENCY_ALERT, move |env| {
                match serde_json::from_value::<EmergencyAlert>(env.payload.clone()) {
                    Ok(alert) => me.ingest(alert),
                    Err(err) => {
                        warn!(error = %err, "undecodable emergency-alert envelope dropped");
                    }
                }
            });
    }

    /// Triggers the emergency protocol.
    ///
    /// Creates the alert (an error here propagates — there is nothing to
    /// dispatch without a server record), then runs all six steps with
    /// per-step failure isolation and fans the alert out to local callbacks.
    pub async fn trigger(
        &self,
        kind: AlertKind,
        severity: Severity,
        message: &str,
        location: GeoPoint,
    ) -> Result<DispatchReport, ApiError> {
        let alert = self
            .inner
            .api
            .create_alert(kind, severity, &location, message)
            .await?;
        self.inner
            .alerts
            .lock()
            .expect("lock poisoned")
            .insert(alert.id.clone(), alert.clone());
        self.inner
            .bus
            .publish(Telemetry::new(TelemetryKind::AlertCreated).with_alert(alert.id.clone()));

        let mut steps = Vec::with_capacity(6);

        steps.push(
            self.run_step(&alert.id, DispatchStep::Broadcast, async {
                let payload =
                    serde_json::to_value(&alert).map_err(|err| DispatchError::Collaborator {
                        reason: err.to_string(),
                    })?;
                self.inner.channel.emit(event_types::EMERGENCY_ALERT, payload);
                Ok(())
            })
            .await,
        );

        steps.push(
            self.run_step(&alert.id, DispatchStep::NotifyContacts, async {
                self.inner
                    .api
                    .notify_contacts(
                        &alert.id,
                        &alert.tourist_id,
                        &alert.location,
                        &alert.message,
                        alert.severity,
                    )
                    .await
                    .map(|_| ())
                    .map_err(DispatchError::from)
            })
            .await,
        );

        steps.push(
            self.run_step(&alert.id, DispatchStep::NotifyServices, async {
                self.inner
                    .api
                    .notify_emergency_services(
                        &alert.id,
                        alert.kind,
                        alert.severity,
                        &alert.location,
                        &self.inner.profile,
                    )
                    .await
                    .map(|_| ())
                    .map_err(DispatchError::from)
            })
            .await,
        );

        // Incident reports are filed only for crimes and critical alerts.
        if alert.kind == AlertKind::Crime || alert.severity == Severity::Critical {
            steps.push(
                self.run_step(&alert.id, DispatchStep::IncidentReport, async {
                    self.inner
                        .api
                        .generate_incident_report(
                            &alert.id,
                            alert.kind,
                            &alert.location,
                            &alert.message,
                            &self.inner.profile,
                            alert.created_at,
                        )
                        .await
                        .map(|_| ())
                        .map_err(DispatchError::from)
                })
                .await,
            );
        } else {
            self.inner.bus.publish(
                Telemetry::new(TelemetryKind::StepSkipped)
                    .with_alert(alert.id.clone())
                    .with_step(DispatchStep::IncidentReport.as_label()),
            );
            steps.push(StepReport::skipped(DispatchStep::IncidentReport));
        }

        steps.push(
            self.run_step(&alert.id, DispatchStep::StartBeacon, async {
                self.inner.beacon.start(&alert.id).map_err(DispatchError::from)
            })
            .await,
        );

        steps.push(
            self.run_step(&alert.id, DispatchStep::NotifyNearbyOperators, async {
                self.inner
                    .api
                    .notify_nearby_operators(
                        &alert.id,
                        &alert.location,
                        self.inner.config.nearby_radius_m,
                    )
                    .await
                    .map(|_| ())
                    .map_err(DispatchError::from)
            })
            .await,
        );

        self.inner.callbacks.notify(&alert);
        Ok(DispatchReport { alert, steps })
    }

    /// Registers a local alert callback; returns its id.
    pub fn on_emergency_alert(
        &self,
        cb: impl Fn(&EmergencyAlert) + Send + Sync + 'static,
    ) -> CallbackId {
        self.inner.callbacks.add(cb)
    }

    /// Removes a local alert callback. Returns false for unknown ids.
    pub fn off_emergency_alert(&self, id: CallbackId) -> bool {
        self.inner.callbacks.remove(id)
    }

    /// Marks the alert acknowledged by `actor`.
    ///
    /// Errors propagate so the UI can retry; the client refuses backward
    /// status transitions before calling out.
    pub async fn acknowledge(&self, alert_id: &str, actor: &str) -> Result<(), ApiError> {
        self.guard_transition(alert_id, AlertStatus::Acknowledged)?;
        self.inner.api.acknowledge_alert(alert_id, actor).await?;

        let mut alerts = self.inner.alerts.lock().expect("lock poisoned");
        if let Some(alert) = alerts.get_mut(alert_id) {
            alert.status = AlertStatus::Acknowledged;
            alert.acknowledged_at = Some(SystemTime::now());
        }
        drop(alerts);

        self.inner.bus.publish(
            Telemetry::new(TelemetryKind::AlertUpdated)
                .with_alert(alert_id)
                .with_reason("acknowledged"),
        );
        Ok(())
    }

    /// Marks the alert resolved by `actor` and stops its beacon.
    pub async fn resolve(
        &self,
        alert_id: &str,
        resolution: &str,
        actor: &str,
    ) -> Result<(), ApiError> {
        self.guard_transition(alert_id, AlertStatus::Resolved)?;
        self.inner.api.resolve_alert(alert_id, resolution, actor).await?;

        let mut alerts = self.inner.alerts.lock().expect("lock poisoned");
        if let Some(alert) = alerts.get_mut(alert_id) {
            alert.status = AlertStatus::Resolved;
            alert.resolved_at = Some(SystemTime::now());
        }
        drop(alerts);

        // A resolved alert must not keep sampling positions.
        self.inner.beacon.stop(alert_id);

        self.inner.bus.publish(
            Telemetry::new(TelemetryKind::AlertUpdated)
                .with_alert(alert_id)
                .with_reason("resolved"),
        );
        Ok(())
    }

    /// Returns the working copy of an alert, if this client has seen it.
    pub fn alert(&self, alert_id: &str) -> Option<EmergencyAlert> {
        self.inner
            .alerts
            .lock()
            .expect("lock poisoned")
            .get(alert_id)
            .cloned()
    }

    /// Updates the working copy from an inbound alert and fans it out.
    fn ingest(&self, alert: EmergencyAlert) {
        self.inner
            .alerts
            .lock()
            .expect("lock poisoned")
            .insert(alert.id.clone(), alert.clone());
        self.inner.callbacks.notify(&alert);
    }

    /// Refuses backward status transitions on the working copy. Unknown ids
    /// pass through: the server is authoritative for alerts we never saw.
    fn guard_transition(&self, alert_id: &str, next: AlertStatus) -> Result<(), ApiError> {
        let alerts = self.inner.alerts.lock().expect("lock poisoned");
        if let Some(alert) = alerts.get(alert_id) {
            if !alert.status.allows(next) {
                return Err(ApiError::InvalidTransition {
                    from: alert.status,
                    to: next,
                });
            }
        }
        Ok(())
    }

    /// Runs one step under the configured timeout, capturing any failure into
    /// the report so the next step always runs.
    async fn run_step<F>(&self, alert_id: &str, step: DispatchStep, fut: F) -> StepReport
    where
        F: Future<Output = Result<(), DispatchError>>,
    {
        let deadline = self.inner.config.step_timeout;
        let report = match time::timeout(deadline, fut).await {
            Ok(Ok(())) => StepReport::ok(step),
            Ok(Err(err)) => StepReport::failed(step, err.to_string()),
            Err(_) => StepReport::failed(
                step,
                DispatchError::Timeout { timeout: deadline }.to_string(),
            ),
        };

        match report.outcome {
            StepOutcome::Ok => {
                self.inner.bus.publish(
                    Telemetry::new(TelemetryKind::StepCompleted)
                        .with_alert(alert_id)
                        .with_step(step.as_label()),
                );
            }
            StepOutcome::Failed => {
                let reason = report.error.clone().unwrap_or_default();
                warn!(alert = alert_id, step = step.as_label(), %reason, "dispatch step failed");
                self.inner.bus.publish(
                    Telemetry::new(TelemetryKind::StepFailed)
                        .with_alert(alert_id)
                        .with_step(step.as_label())
                        .with_reason(reason),
                );
            }
            StepOutcome::Skipped => {}
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::{
        PositionSource, SampleFn, WatchErrorFn, WatchOptions, WatchToken,
    };
    use crate::channel::{Connection, Transport};
    use crate::error::{BeaconError, TransportError};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
    use std::time::Duration;

    use crate::emergency::api::{DispatchRecord, NotificationResult};

    /// Records collaborator calls; configured call names fail or hang.
    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<&'static str>>,
        failing: Mutex<HashSet<&'static str>>,
        hanging: Mutex<HashSet<&'static str>>,
        next_id: AtomicU32,
    }

    impl RecordingApi {
        fn fail(&self, call: &'static str) {
            self.failing.lock().expect("lock poisoned").insert(call);
        }

        fn hang(&self, call: &'static str) {
            self.hanging.lock().expect("lock poisoned").insert(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().expect("lock poisoned").clone()
        }

        async fn record(&self, call: &'static str) -> Result<(), ApiError> {
            self.calls.lock().expect("lock poisoned").push(call);
            if self.hanging.lock().expect("lock poisoned").contains(call) {
                futures::future::pending::<()>().await;
            }
            if self.failing.lock().expect("lock poisoned").contains(call) {
                return Err(ApiError::Remote {
                    reason: format!("{call} unavailable"),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EmergencyApi for RecordingApi {
        async fn create_alert(
            &self,
            kind: AlertKind,
            severity: Severity,
            location: &GeoPoint,
            message: &str,
        ) -> Result<EmergencyAlert, ApiError> {
            self.record("create").await?;
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(EmergencyAlert {
                id: format!("a-{n}"),
                tourist_id: "t-1".into(),
                kind,
                severity,
                status: AlertStatus::Active,
                message: message.into(),
                location: location.clone(),
                created_at: SystemTime::now(),
                acknowledged_at: None,
                resolved_at: None,
            })
        }

        async fn notify_contacts(
            &self,
            _alert_id: &str,
            _tourist_id: &str,
            _location: &GeoPoint,
            _message: &str,
            _severity: Severity,
        ) -> Result<Vec<NotificationResult>, ApiError> {
            self.record("contacts").await?;
            Ok(vec![NotificationResult {
                contact: "mom".into(),
                delivered: true,
            }])
        }

        async fn notify_emergency_services(
            &self,
            _alert_id: &str,
            _kind: AlertKind,
            _severity: Severity,
            _location: &GeoPoint,
            _tourist: &TouristProfile,
        ) -> Result<DispatchRecord, ApiError> {
            self.record("services").await?;
            Ok(DispatchRecord {
                reference: "svc-9".into(),
                service: "police".into(),
            })
        }

        async fn generate_incident_report(
            &self,
            _alert_id: &str,
            _kind: AlertKind,
            _location: &GeoPoint,
            _description: &str,
            _tourist: &TouristProfile,
            _at: SystemTime,
        ) -> Result<String, ApiError> {
            self.record("report").await?;
            Ok("rep-1".into())
        }

        async fn notify_nearby_operators(
            &self,
            _alert_id: &str,
            _location: &GeoPoint,
            radius_m: u32,
        ) -> Result<u32, ApiError> {
            assert_eq!(radius_m, 5_000);
            self.record("nearby").await?;
            Ok(3)
        }

        async fn acknowledge_alert(&self, _alert_id: &str, _actor: &str) -> Result<(), ApiError> {
            self.record("ack").await
        }

        async fn resolve_alert(
            &self,
            _alert_id: &str,
            _resolution: &str,
            _actor: &str,
        ) -> Result<(), ApiError> {
            self.record("resolve").await
        }
    }

    #[derive(Default)]
    struct CountingSource {
        next_token: AtomicU64,
        watches: Mutex<Vec<WatchToken>>,
        cancelled: Mutex<Vec<WatchToken>>,
    }

    impl PositionSource for CountingSource {
        fn watch(
            &self,
            _opts: WatchOptions,
            _on_sample: SampleFn,
            _on_error: WatchErrorFn,
        ) -> Result<WatchToken, BeaconError> {
            let token = self.next_token.fetch_add(1, Ordering::SeqCst);
            self.watches.lock().expect("lock poisoned").push(token);
            Ok(token)
        }

        fn cancel(&self, token: WatchToken) {
            self.cancelled.lock().expect("lock poisoned").push(token);
        }
    }

    /// Transport whose handshake always fails; the channel stays closed and
    /// broadcast emits are dropped there, which is fine for these tests.
    struct DeadTransport;

    #[async_trait]
    impl Transport for DeadTransport {
        async fn connect(&self, _credential: &str) -> Result<Box<dyn Connection>, TransportError> {
            Err(TransportError::Handshake {
                reason: "offline".into(),
            })
        }
    }

    struct Fixture {
        api: Arc<RecordingApi>,
        source: Arc<CountingSource>,
        beacon: BeaconController,
        orch: Orchestrator,
    }

    fn fixture() -> Fixture {
        let config = Config {
            step_timeout: Duration::from_millis(500),
            ..Config::default()
        };
        let bus = Bus::new(64);
        let channel = ChannelManager::new(Arc::new(DeadTransport), config.clone(), bus.clone());
        let source = Arc::new(CountingSource::default());
        let beacon = BeaconController::new(
            Arc::clone(&source) as Arc<dyn PositionSource>,
            channel.clone(),
            config.clone(),
            bus.clone(),
        );
        let api = Arc::new(RecordingApi::default());
        let orch = Orchestrator::new(
            Arc::clone(&api) as Arc<dyn EmergencyApi>,
            channel,
            beacon.clone(),
            TouristProfile {
                tourist_id: "t-1".into(),
                name: "Asha".into(),
                phone: Some("+91-000".into()),
            },
            config,
            bus,
        );
        Fixture {
            api,
            source,
            beacon,
            orch,
        }
    }

    fn delhi() -> GeoPoint {
        GeoPoint::new(28.61, 77.20)
    }

    #[tokio::test]
    async fn sos_high_records_six_steps_and_skips_report() {
        let fx = fixture();
        let report = fx
            .orch
            .trigger(AlertKind::Sos, Severity::High, "help", delhi())
            .await
            .unwrap();

        assert_eq!(report.alert.status, AlertStatus::Active);
        assert_eq!(report.steps.len(), 6);
        assert_eq!(
            report.step(DispatchStep::IncidentReport).unwrap().outcome,
            StepOutcome::Skipped
        );
        assert_eq!(report.failed_steps().count(), 0);
        assert_eq!(fx.api.calls(), vec!["create", "contacts", "services", "nearby"]);
        assert!(fx.beacon.is_active(&report.alert.id));
    }

    #[tokio::test]
    async fn crime_medium_files_an_incident_report() {
        let fx = fixture();
        let report = fx
            .orch
            .trigger(AlertKind::Crime, Severity::Medium, "theft", delhi())
            .await
            .unwrap();

        assert!(report.step(DispatchStep::IncidentReport).unwrap().is_ok());
        assert!(fx.api.calls().contains(&"report"));
    }

    #[tokio::test]
    async fn critical_severity_files_a_report_even_when_earlier_steps_fail() {
        let fx = fixture();
        fx.api.fail("contacts");
        fx.api.fail("services");

        let report = fx
            .orch
            .trigger(AlertKind::Medical, Severity::Critical, "collapse", delhi())
            .await
            .unwrap();

        assert!(report.step(DispatchStep::IncidentReport).unwrap().is_ok());
        assert_eq!(report.failed_steps().count(), 2);
    }

    #[tokio::test]
    async fn failed_contacts_step_never_blocks_the_rest() {
        let fx = fixture();
        fx.api.fail("contacts");

        let report = fx
            .orch
            .trigger(AlertKind::Sos, Severity::High, "help", delhi())
            .await
            .unwrap();

        let contacts = report.step(DispatchStep::NotifyContacts).unwrap();
        assert_eq!(contacts.outcome, StepOutcome::Failed);
        assert!(contacts.error.as_deref().unwrap().contains("contacts"));

        // Steps 3-6 still ran and were recorded.
        assert!(report.step(DispatchStep::NotifyServices).unwrap().is_ok());
        assert!(report.step(DispatchStep::StartBeacon).unwrap().is_ok());
        assert!(report.step(DispatchStep::NotifyNearbyOperators).unwrap().is_ok());
        assert_eq!(fx.api.calls(), vec!["create", "contacts", "services", "nearby"]);
        assert_eq!(fx.source.watches.lock().expect("lock poisoned").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_collaborator_times_out_as_a_failed_step() {
        let fx = fixture();
        fx.api.hang("services");

        let report = fx
            .orch
            .trigger(AlertKind::Sos, Severity::High, "help", delhi())
            .await
            .unwrap();

        let services = report.step(DispatchStep::NotifyServices).unwrap();
        assert_eq!(services.outcome, StepOutcome::Failed);
        assert!(services.error.as_deref().unwrap().contains("timed out"));
        assert!(report.step(DispatchStep::NotifyNearbyOperators).unwrap().is_ok());
    }

    #[tokio::test]
    async fn create_failure_propagates_and_runs_no_steps() {
        let fx = fixture();
        fx.api.fail("create");

        let err = fx
            .orch
            .trigger(AlertKind::Sos, Severity::High, "help", delhi())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Remote { .. }));
        assert_eq!(fx.api.calls(), vec!["create"]);
        assert!(fx.source.watches.lock().expect("lock poisoned").is_empty());
    }

    #[tokio::test]
    async fn local_callbacks_fan_out_on_trigger_in_order() {
        let fx = fixture();
        let order: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        fx.orch.on_emergency_alert(move |_| o.lock().expect("lock poisoned").push(1));
        fx.orch.on_emergency_alert(|_| panic!("widget crashed"));
        let o = Arc::clone(&order);
        fx.orch.on_emergency_alert(move |_| o.lock().expect("lock poisoned").push(3));

        fx.orch
            .trigger(AlertKind::Panic, Severity::High, "panic", delhi())
            .await
            .unwrap();
        assert_eq!(*order.lock().expect("lock poisoned"), vec![1, 3]);
    }

    #[tokio::test]
    async fn off_emergency_alert_unsubscribes() {
        let fx = fixture();
        let hits: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        let id = fx
            .orch
            .on_emergency_alert(move |_| *h.lock().expect("lock poisoned") += 1);
        assert!(fx.orch.off_emergency_alert(id));

        fx.orch
            .trigger(AlertKind::Sos, Severity::Low, "test", delhi())
            .await
            .unwrap();
        assert_eq!(*hits.lock().expect("lock poisoned"), 0);
    }

    #[tokio::test]
    async fn acknowledge_then_resolve_walks_the_status_forward() {
        let fx = fixture();
        let report = fx
            .orch
            .trigger(AlertKind::Sos, Severity::High, "help", delhi())
            .await
            .unwrap();
        let id = report.alert.id.clone();

        fx.orch.acknowledge(&id, "operator-7").await.unwrap();
        let copy = fx.orch.alert(&id).unwrap();
        assert_eq!(copy.status, AlertStatus::Acknowledged);
        assert!(copy.acknowledged_at.is_some());

        fx.orch.resolve(&id, "tourist safe", "operator-7").await.unwrap();
        let copy = fx.orch.alert(&id).unwrap();
        assert_eq!(copy.status, AlertStatus::Resolved);
        assert!(copy.resolved_at.is_some());
    }

    #[tokio::test]
    async fn resolution_stops_the_alerts_beacon() {
        let fx = fixture();
        let report = fx
            .orch
            .trigger(AlertKind::Sos, Severity::High, "help", delhi())
            .await
            .unwrap();
        let id = report.alert.id.clone();
        assert!(fx.beacon.is_active(&id));

        fx.orch.resolve(&id, "found", "operator-1").await.unwrap();
        assert!(!fx.beacon.is_active(&id));
        assert_eq!(fx.source.cancelled.lock().expect("lock poisoned").len(), 1);
    }

    #[tokio::test]
    async fn backward_transition_is_refused_client_side() {
        let fx = fixture();
        let report = fx
            .orch
            .trigger(AlertKind::Sos, Severity::High, "help", delhi())
            .await
            .unwrap();
        let id = report.alert.id.clone();

        fx.orch.resolve(&id, "done", "op").await.unwrap();
        let err = fx.orch.acknowledge(&id, "op").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidTransition {
                from: AlertStatus::Resolved,
                to: AlertStatus::Acknowledged,
            }
        ));
        // The collaborator was never called for the refused transition.
        assert_eq!(fx.api.calls().iter().filter(|c| **c == "ack").count(), 0);
    }

    #[tokio::test]
    async fn acknowledge_failure_propagates_for_ui_retry() {
        let fx = fixture();
        fx.api.fail("ack");
        let report = fx
            .orch
            .trigger(AlertKind::Sos, Severity::High, "help", delhi())
            .await
            .unwrap();

        let err = fx.orch.acknowledge(&report.alert.id, "op").await.unwrap_err();
        assert!(matches!(err, ApiError::Remote { .. }));
        // Working copy untouched on failure.
        assert_eq!(
            fx.orch.alert(&report.alert.id).unwrap().status,
            AlertStatus::Active
        );
    }

    #[tokio::test]
    async fn inbound_channel_alert_reaches_local_callbacks() {
        let fx = fixture();
        fx.orch.bind_channel();

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        fx.orch
            .on_emergency_alert(move |alert| s.lock().expect("lock poisoned").push(alert.id.clone()));

        // Simulate the channel dispatching an inbound alert envelope.
        let alert = fx
            .orch
            .trigger(AlertKind::Sos, Severity::High, "help", delhi())
            .await
            .unwrap()
            .alert;
        let mut inbound = alert.clone();
        inbound.id = "a-remote".into();
        fx.orch.ingest(inbound);

        let seen = seen.lock().expect("lock poisoned").clone();
        assert!(seen.contains(&alert.id.to_string()));
        assert!(seen.contains(&"a-remote".to_string()));
        assert!(fx.orch.alert("a-remote").is_some());
    }
}
