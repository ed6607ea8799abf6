//! # Emergency alert data model.
//!
//! [`EmergencyAlert`] is the client's working copy of an alert; the server is
//! the system of record. Wire names follow the dashboard API
//! (camelCase fields, SCREAMING_SNAKE_CASE enum values).
//!
//! ## Status monotonicity
//! `Active → Acknowledged → Dispatched → Resolved`. The client never moves an
//! alert backwards; forward skips (e.g. resolving an unacknowledged alert)
//! are allowed. Server-authoritative overrides are out of scope.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// What kind of emergency was triggered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    Sos,
    Panic,
    Medical,
    Accident,
    Crime,
    NaturalDisaster,
}

impl AlertKind {
    /// Short stable label (snake_case) for logs/telemetry.
    pub fn as_label(&self) -> &'static str {
        match self {
            AlertKind::Sos => "sos",
            AlertKind::Panic => "panic",
            AlertKind::Medical => "medical",
            AlertKind::Accident => "accident",
            AlertKind::Crime => "crime",
            AlertKind::NaturalDisaster => "natural_disaster",
        }
    }
}

/// How severe the emergency is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Client-visible lifecycle of an alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Dispatched,
    Resolved,
}

impl AlertStatus {
    fn rank(&self) -> u8 {
        match self {
            AlertStatus::Active => 0,
            AlertStatus::Acknowledged => 1,
            AlertStatus::Dispatched => 2,
            AlertStatus::Resolved => 3,
        }
    }

    /// True when moving from `self` to `next` goes forward (monotonic).
    pub fn allows(&self, next: AlertStatus) -> bool {
        next.rank() > self.rank()
    }
}

/// Geographic point with optional reverse-geocoded address and fix accuracy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl GeoPoint {
    /// Creates a bare coordinate pair.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            address: None,
            accuracy: None,
        }
    }
}

/// Working copy of one emergency alert.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyAlert {
    /// Server-assigned alert id.
    pub id: String,
    /// Tourist this alert belongs to.
    pub tourist_id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
    pub status: AlertStatus,
    pub message: String,
    pub location: GeoPoint,
    pub created_at: SystemTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<SystemTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<SystemTime>,
}
