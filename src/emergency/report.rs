//! # Dispatch steps and their per-execution reports.
//!
//! The emergency protocol is an **ordered** sequence of six independent
//! steps. Each execution produces one [`StepReport`]; a failure is captured
//! there and never blocks the steps after it. Reports are ephemeral —
//! telemetry and tests consume them, nothing replays them.

use std::fmt;

/// The six dispatch steps, in their fixed execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchStep {
    /// Broadcast the alert on the operator channel (outbound emit).
    Broadcast,
    /// Notify the tourist's registered emergency contacts.
    NotifyContacts,
    /// Notify the external emergency-services collaborator.
    NotifyServices,
    /// Generate an incident report (only for CRIME or CRITICAL alerts).
    IncidentReport,
    /// Start the location beacon for this alert id.
    StartBeacon,
    /// Notify operators within the configured radius of the alert location.
    NotifyNearbyOperators,
}

impl DispatchStep {
    /// Short stable label (kebab-case) for logs/telemetry.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchStep::Broadcast => "broadcast",
            DispatchStep::NotifyContacts => "notify-contacts",
            DispatchStep::NotifyServices => "notify-services",
            DispatchStep::IncidentReport => "incident-report",
            DispatchStep::StartBeacon => "start-beacon",
            DispatchStep::NotifyNearbyOperators => "notify-nearby-operators",
        }
    }
}

impl fmt::Display for DispatchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Outcome of one step execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step ran and succeeded.
    Ok,
    /// The step ran and failed (collaborator error or timeout).
    Failed,
    /// The step's condition did not apply; it was not executed.
    Skipped,
}

/// Result of one dispatch-step execution.
#[derive(Clone, Debug)]
pub struct StepReport {
    /// Which step this report covers.
    pub step: DispatchStep,
    /// How the step ended.
    pub outcome: StepOutcome,
    /// Failure description when `outcome == Failed`.
    pub error: Option<String>,
}

impl StepReport {
    /// Report a successful step.
    pub fn ok(step: DispatchStep) -> Self {
        Self {
            step,
            outcome: StepOutcome::Ok,
            error: None,
        }
    }

    /// Report a failed step with its error description.
    pub fn failed(step: DispatchStep, error: impl Into<String>) -> Self {
        Self {
            step,
            outcome: StepOutcome::Failed,
            error: Some(error.into()),
        }
    }

    /// Report a conditional step that did not apply.
    pub fn skipped(step: DispatchStep) -> Self {
        Self {
            step,
            outcome: StepOutcome::Skipped,
            error: None,
        }
    }

    /// True when the step ran and succeeded.
    pub fn is_ok(&self) -> bool {
        self.outcome == StepOutcome::Ok
    }
}

/// Aggregate outcome of one trigger: the created alert plus all six step
/// reports in execution order.
#[derive(Clone, Debug)]
pub struct DispatchReport {
    /// The alert created for this trigger (status `Active`).
    pub alert: crate::emergency::EmergencyAlert,
    /// One report per step, in the fixed execution order.
    pub steps: Vec<StepReport>,
}

impl DispatchReport {
    /// Returns the report for a given step, if recorded.
    pub fn step(&self, step: DispatchStep) -> Option<&StepReport> {
        self.steps.iter().find(|r| r.step == step)
    }

    /// Returns the steps that ran and failed.
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|r| r.outcome == StepOutcome::Failed)
    }
}
