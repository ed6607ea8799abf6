//! Error types used across the alertwire client.
//!
//! The taxonomy mirrors where each failure is allowed to surface:
//!
//! - [`TransportError`] — handshake/socket failures. They drive the channel's
//!   reconnection policy and are reported as telemetry; they are never raised
//!   to callers of `emit`/`on`.
//! - [`DispatchError`] — a single dispatch step failed (collaborator error or
//!   timeout). Captured into a step report, logged, non-fatal: the remaining
//!   steps always run.
//! - [`ApiError`] — a direct user-invoked remote mutation failed (alert
//!   creation, acknowledge, resolve). Propagated to the caller so the UI can
//!   retry.
//! - [`BeaconError`] — the position source refused a watch or a sample failed.
//!
//! All enums provide `as_label()` returning a short stable snake_case label
//! for logs and telemetry.

use std::time::Duration;

use thiserror::Error;

use crate::emergency::AlertStatus;

/// Errors produced by the persistent event channel.
///
/// These never propagate past the channel manager: every variant is converted
/// into telemetry plus a state transition (usually back to `Disconnected`,
/// which arms the retry policy).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransportError {
    /// The transport refused the connection or the handshake failed.
    #[error("handshake failed: {reason}")]
    Handshake {
        /// Underlying failure description.
        reason: String,
    },

    /// The handshake did not complete within the configured deadline.
    #[error("handshake timed out after {timeout:?}")]
    HandshakeTimeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// An established connection failed while receiving.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Underlying failure description.
        reason: String,
    },

    /// An outbound frame could not be written to the connection.
    #[error("send failed: {reason}")]
    Send {
        /// Underlying failure description.
        reason: String,
    },
}

impl TransportError {
    /// Returns a short stable label (snake_case) for logs/telemetry.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Handshake { .. } => "transport_handshake",
            TransportError::HandshakeTimeout { .. } => "transport_handshake_timeout",
            TransportError::ConnectionLost { .. } => "transport_connection_lost",
            TransportError::Send { .. } => "transport_send",
        }
    }
}

/// Failure of one emergency dispatch step.
///
/// Step failures are captured into [`StepReport`](crate::emergency::StepReport)
/// entries and never abort the remaining steps.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The external collaborator call returned an error.
    #[error("collaborator call failed: {reason}")]
    Collaborator {
        /// Underlying failure description.
        reason: String,
    },

    /// The collaborator call exceeded the configured step timeout.
    #[error("step timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The beacon could not be started for this alert.
    #[error(transparent)]
    Beacon(#[from] BeaconError),
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for logs/telemetry.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::Collaborator { .. } => "step_collaborator",
            DispatchError::Timeout { .. } => "step_timeout",
            DispatchError::Beacon(_) => "step_beacon",
        }
    }
}

impl From<ApiError> for DispatchError {
    fn from(err: ApiError) -> Self {
        DispatchError::Collaborator {
            reason: err.to_string(),
        }
    }
}

/// Errors from direct user-invoked remote mutations.
///
/// Unlike transport and dispatch-step errors these are propagated to the
/// caller: acknowledge/resolve are explicit state transitions and the UI must
/// be able to surface the failure and retry.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ApiError {
    /// The remote collaborator rejected or failed the call.
    #[error("remote call failed: {reason}")]
    Remote {
        /// Underlying failure description.
        reason: String,
    },

    /// The requested status change would move the alert backwards.
    ///
    /// Alert status is monotonic on the client:
    /// `Active → Acknowledged → Dispatched → Resolved`.
    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Current status of the working copy.
        from: AlertStatus,
        /// Requested status.
        to: AlertStatus,
    },
}

impl ApiError {
    /// Returns a short stable label (snake_case) for logs/telemetry.
    pub fn as_label(&self) -> &'static str {
        match self {
            ApiError::Remote { .. } => "api_remote",
            ApiError::InvalidTransition { .. } => "api_invalid_transition",
        }
    }
}

/// Errors from the position source backing the location beacon.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BeaconError {
    /// The position source could not start a watch.
    #[error("position source unavailable: {reason}")]
    SourceUnavailable {
        /// Underlying failure description.
        reason: String,
    },

    /// A position sample failed while the watch was running.
    #[error("position sample failed: {reason}")]
    Sample {
        /// Underlying failure description.
        reason: String,
    },
}

impl BeaconError {
    /// Returns a short stable label (snake_case) for logs/telemetry.
    pub fn as_label(&self) -> &'static str {
        match self {
            BeaconError::SourceUnavailable { .. } => "beacon_source_unavailable",
            BeaconError::Sample { .. } => "beacon_sample",
        }
    }
}
