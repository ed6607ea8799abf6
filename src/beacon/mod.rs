//! # Location beacon: continuous position sampling per active alert.
//!
//! ## Contents
//! - [`BeaconController`] — start/stop of per-alert watches, handle map,
//!   sample → `location-update` emit
//! - [`PositionSource`] — seam to the platform geolocation service
//! - [`WatchOptions`], [`PositionSample`], [`WatchToken`] — watch data model
//!
//! ## Wiring
//! ```text
//! Orchestrator ── start(alert_id) ──► BeaconController ──► PositionSource::watch
//!                                          │                     │ samples
//!                                          ▼                     ▼
//!                                    handles map        ChannelManager::emit("location-update")
//! ```

mod controller;
mod source;

pub use controller::{BeaconController, BeaconHandle};
pub use source::{PositionSample, PositionSource, SampleFn, WatchErrorFn, WatchOptions, WatchToken};
