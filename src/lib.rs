//! # alertwire
//!
//! **Alertwire** is the real-time safety client for the tourist dashboard:
//! a persistent event channel with capped reconnection, an emergency dispatch
//! orchestrator with per-step failure isolation, and a location beacon that
//! streams position fixes for active alerts.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!      UI / dashboard code
//!        │ trigger / acknowledge / resolve          │ on("emergency-alert")
//!        ▼                                          ▼
//! ┌───────────────────────────────┐   ┌───────────────────────────────────┐
//! │  Orchestrator                 │   │  ChannelManager                   │
//! │  - create_alert (propagates)  │   │  - one connection, owned I/O task │
//! │  - 6 ordered dispatch steps   │──►│  - SubscriptionRegistry           │
//! │    (each isolated, reported)  │emit│    (last-writer-wins handlers)   │
//! │  - AlertCallbacks fan-out     │   │  - fixed-interval capped retries  │
//! └──────────┬────────────────────┘   └───────┬───────────────────────────┘
//!            │ start/stop                     │ emit("location-update")
//!            ▼                                │
//! ┌───────────────────────────────┐           │
//! │  BeaconController             │───────────┘
//! │  - one watch per alert id     │
//! │  - PositionSource seam        │
//! └───────────────────────────────┘
//!
//! All three publish Telemetry on the Bus (broadcast channel):
//!
//!     Bus ──► SubscriberSet::spawn_listener ──► per-subscriber queues
//!                                                 ▼         ▼
//!                                              worker1 … workerN
//!                                              (panic-isolated)
//! ```
//!
//! ### Channel lifecycle
//! ```text
//! connect() ──► Connecting ──handshake ok──► Open ──► serve(): pump frames
//!                   │                                    │
//!                   │ handshake failed/timeout           │ socket error/close
//!                   ▼                                    ▼
//!              Disconnected ◄────────────────────────────┘
//!                   │
//!                   │ attempts < cap: sleep(retry_interval) ──► Connecting
//!                   └─ attempts = cap: park until explicit connect()
//! ```
//!
//! ## Features
//! | Area           | Description                                               | Key types / traits                          |
//! |----------------|-----------------------------------------------------------|---------------------------------------------|
//! | **Channel**    | Persistent event channel, typed subscriptions, emit.      | [`ChannelManager`], [`Transport`]           |
//! | **Emergency**  | Trigger, six ordered isolated steps, ack/resolve.         | [`Orchestrator`], [`EmergencyApi`]          |
//! | **Beacon**     | Per-alert continuous position sampling.                   | [`BeaconController`], [`PositionSource`]    |
//! | **Telemetry**  | Observe everything the client does (logging, metrics).    | [`Subscribe`], [`Telemetry`], [`Bus`]       |
//! | **Errors**     | Typed errors per surface, each with a stable label.       | [`ApiError`], [`DispatchError`]             |
//! | **Config**     | Centralized runtime settings.                             | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] telemetry subscriber.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use alertwire::{
//!     AlertKind, Bus, ChannelManager, Config, GeoPoint, Orchestrator,
//!     BeaconController, Session, Severity, TouristProfile,
//! };
//! # use alertwire::{Connection, EmergencyApi, PositionSource, Transport};
//! # fn wiring(transport: Arc<dyn Transport>, api: Arc<dyn EmergencyApi>,
//! #           source: Arc<dyn PositionSource>) {
//! let config = Config::default();
//! let bus = Bus::new(config.bus_capacity_clamped());
//!
//! let channel = ChannelManager::new(transport, config.clone(), bus.clone());
//! channel.set_session(Session {
//!     token: "jwt".into(),
//!     tourist_id: "t-42".into(),
//! });
//!
//! let beacon = BeaconController::new(source, channel.clone(), config.clone(), bus.clone());
//! let profile = TouristProfile {
//!     tourist_id: "t-42".into(),
//!     name: "Asha".into(),
//!     phone: None,
//! };
//! let orchestrator = Orchestrator::new(api, channel.clone(), beacon, profile, config, bus);
//! orchestrator.bind_channel();
//!
//! channel.connect();
//! # let _ = async {
//! let report = orchestrator
//!     .trigger(AlertKind::Sos, Severity::High, "help", GeoPoint::new(28.61, 77.20))
//!     .await?;
//! for step in &report.steps {
//!     println!("{}: {:?}", step.step, step.outcome);
//! }
//! # Ok::<(), alertwire::ApiError>(())
//! # };
//! # }
//! ```

mod beacon;
mod channel;
mod config;
mod emergency;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use beacon::{
    BeaconController, BeaconHandle, PositionSample, PositionSource, SampleFn, WatchErrorFn,
    WatchOptions, WatchToken,
};
pub use channel::{
    ChannelManager, Connection, ConnectionState, EventHandler, Session, SubscriptionRegistry,
    Transport,
};
pub use config::Config;
pub use emergency::{
    AlertCallbacks, AlertKind, AlertStatus, CallbackId, DispatchRecord, DispatchReport,
    DispatchStep, EmergencyAlert, EmergencyApi, GeoPoint, NotificationResult, Orchestrator,
    Severity, StepOutcome, StepReport, TouristProfile,
};
pub use error::{ApiError, BeaconError, DispatchError, TransportError};
pub use events::{Bus, Envelope, Frame, Telemetry, TelemetryKind, event_types};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
