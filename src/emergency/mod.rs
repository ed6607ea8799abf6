//! # Emergency protocol: trigger, ordered dispatch, local fan-out.
//!
//! ## Contents
//! - [`Orchestrator`] — alert creation, the six ordered dispatch steps,
//!   acknowledge/resolve transitions
//! - [`EmergencyApi`] — seam to the remote alert backend
//! - [`AlertCallbacks`] — in-process, panic-isolated alert fan-out
//! - [`DispatchReport`], [`StepReport`] — per-trigger outcome record
//! - [`EmergencyAlert`] and friends — the alert data model
//!
//! ## Flow
//! ```text
//! trigger ──► EmergencyApi::create_alert ──► 6 ordered steps (isolated)
//!                                                 │
//!                      local callbacks ◄──────────┘
//!                            ▲
//!          inbound "emergency-alert" envelopes (via ChannelManager)
//! ```

mod alert;
mod api;
mod callbacks;
mod orchestrator;
mod report;

pub use alert::{AlertKind, AlertStatus, EmergencyAlert, GeoPoint, Severity};
pub use api::{DispatchRecord, EmergencyApi, NotificationResult, TouristProfile};
pub use callbacks::{AlertCallbacks, CallbackId};
pub use orchestrator::Orchestrator;
pub use report::{DispatchReport, DispatchStep, StepOutcome, StepReport};
