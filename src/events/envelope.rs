//! # Typed events received over the persistent channel.
//!
//! A [`Frame`] is the wire form of one event: a type name plus an opaque JSON
//! payload. On arrival the channel manager stamps it into an [`Envelope`],
//! which is immutable and lives only for the duration of dispatch.
//!
//! Well-known event type names are collected in [`event_types`]; the channel
//! itself treats types as opaque strings apart from the
//! [`event_types::MESSAGE`] catch-all.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Well-known event type names on the channel.
pub mod event_types {
    /// Outbound join frame: enter the session's tracking room.
    pub const JOIN_TRACKING_ROOM: &str = "join-tracking-room";
    /// Outbound join frame: subscribe to alert broadcasts.
    pub const SUBSCRIBE_ALERTS: &str = "subscribe-alerts";
    /// An emergency alert broadcast, inbound or outbound.
    pub const EMERGENCY_ALERT: &str = "emergency-alert";
    /// Periodic beacon position update, outbound.
    pub const LOCATION_UPDATE: &str = "location-update";
    /// Catch-all: a handler registered under this name receives **every**
    /// inbound envelope in addition to the typed handler.
    pub const MESSAGE: &str = "message";
}

/// One event on the wire: type name plus opaque payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Frame {
    /// Event type name, e.g. `"emergency-alert"`.
    pub event: String,
    /// Opaque payload; the channel never inspects it.
    pub payload: serde_json::Value,
}

impl Frame {
    /// Creates a new frame.
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

/// A received frame stamped with its arrival time.
///
/// Immutable once created; exists only for the duration of dispatch and is
/// never persisted.
#[derive(Clone, Debug)]
pub struct Envelope {
    /// Event type name.
    pub event: String,
    /// Opaque payload.
    pub payload: serde_json::Value,
    /// Wall-clock arrival timestamp.
    pub received_at: SystemTime,
}

impl Envelope {
    /// Stamps a frame with the current wall-clock time.
    pub fn from_frame(frame: Frame) -> Self {
        Self {
            event: frame.event,
            payload: frame.payload,
            received_at: SystemTime::now(),
        }
    }
}
