//! # External emergency collaborators (interfaces only).
//!
//! [`EmergencyApi`] is the seam to the remote alert backend: alert creation,
//! contact/service notification, incident reporting, nearby-operator lookup
//! and the acknowledge/resolve mutations. Bodies are out of scope — the
//! production implementation is a thin REST client; tests use a recording
//! fake.
//!
//! The orchestrator bounds every dispatch-step call with the configured step
//! timeout; acknowledge/resolve are called directly and their errors
//! propagate.

use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::alert::{AlertKind, EmergencyAlert, GeoPoint, Severity};

/// Tourist identity shared with emergency services and incident reports.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouristProfile {
    pub tourist_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Outcome of notifying one registered emergency contact.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResult {
    /// Contact display name or number.
    pub contact: String,
    /// Whether the notification was delivered.
    pub delivered: bool,
}

/// Reference returned by the emergency-services collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRecord {
    /// Service-side reference for the dispatch.
    pub reference: String,
    /// Which service took the dispatch (police, ambulance, ...).
    pub service: String,
}

/// Remote alert backend, injected into the orchestrator.
#[async_trait]
pub trait EmergencyApi: Send + Sync + 'static {
    /// Creates the alert record; the server assigns the id and is the system
    /// of record.
    async fn create_alert(
        &self,
        kind: AlertKind,
        severity: Severity,
        location: &GeoPoint,
        message: &str,
    ) -> Result<EmergencyAlert, ApiError>;

    /// Notifies the tourist's registered emergency contacts.
    async fn notify_contacts(
        &self,
        alert_id: &str,
        tourist_id: &str,
        location: &GeoPoint,
        message: &str,
        severity: Severity,
    ) -> Result<Vec<NotificationResult>, ApiError>;

    /// Notifies the external emergency-services collaborator.
    async fn notify_emergency_services(
        &self,
        alert_id: &str,
        kind: AlertKind,
        severity: Severity,
        location: &GeoPoint,
        tourist: &TouristProfile,
    ) -> Result<DispatchRecord, ApiError>;

    /// Generates an incident report; returns the report id.
    async fn generate_incident_report(
        &self,
        alert_id: &str,
        kind: AlertKind,
        location: &GeoPoint,
        description: &str,
        tourist: &TouristProfile,
        at: SystemTime,
    ) -> Result<String, ApiError>;

    /// Notifies operators within `radius_m` of the location; returns how many
    /// were reached.
    async fn notify_nearby_operators(
        &self,
        alert_id: &str,
        location: &GeoPoint,
        radius_m: u32,
    ) -> Result<u32, ApiError>;

    /// Marks the alert acknowledged by `actor`.
    async fn acknowledge_alert(&self, alert_id: &str, actor: &str) -> Result<(), ApiError>;

    /// Marks the alert resolved by `actor` with a resolution note.
    async fn resolve_alert(
        &self,
        alert_id: &str,
        resolution: &str,
        actor: &str,
    ) -> Result<(), ApiError>;
}
