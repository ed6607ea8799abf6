//! # Telemetry subscribers for the alertwire client.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out used to consume telemetry broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Telemetry flow:
//!   ChannelManager ─┐
//!   Orchestrator  ──┼─ publish(Telemetry) ──► Bus ──► SubscriberSet listener
//!   Beacon        ──┘                                       │
//!                                              ┌────────────┼───────────┐
//!                                              ▼            ▼           ▼
//!                                          LogWriter     Metrics     Custom
//! ```
//!
//! ## Subscriber isolation
//! Each subscriber owns a bounded queue and a dedicated worker task; a slow or
//! panicking subscriber never affects the others or the publishers.

mod set;
mod subscriber;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
