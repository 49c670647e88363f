//! Per-tick outcome reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::{AsRefStr, Display};

use crate::rotation::Rotation;

/// Overall status of one tick, or of several ticks combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TickStatus {
    /// Batch fetched and stored at every target.
    Success,
    /// Batch fetched, at least one target failed to rotate or store it.
    Partial,
    /// No batch fetched.
    Failed,
}

impl TickStatus {
    /// Combine the statuses of several ticks.
    ///
    /// All success is success, all failed is failed, anything else is partial.
    /// An empty set counts as success.
    pub fn combine(statuses: impl IntoIterator<Item = TickStatus>) -> TickStatus {
        let mut any_success = false;
        let mut any_failed = false;
        let mut any_partial = false;
        for status in statuses {
            match status {
                Self::Success => any_success = true,
                Self::Failed => any_failed = true,
                Self::Partial => any_partial = true,
            }
        }
        match (any_success, any_partial, any_failed) {
            (_, false, false) => Self::Success,
            (false, false, true) => Self::Failed,
            _ => Self::Partial,
        }
    }
}

/// Result of the fetch step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    Fetched { records: usize },
    Failed { error: String },
}

/// Result of rotating and persisting at one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOutcome {
    /// Configured target name.
    pub target: String,
    /// Artifact or table written to.
    pub destination: String,
    /// Rotation in effect for this write. Absent when the rotation check
    /// failed before anything changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
    /// Rotation check error. Persistence still went ahead on the current artifact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_error: Option<String>,
    /// Records written.
    pub records: usize,
    /// Persist error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TargetOutcome {
    /// Neither the rotation check nor the write failed.
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.rotation_error.is_none()
    }
}

/// Everything one tick did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub recorder: String,
    pub started_at: DateTime<Utc>,
    pub fetch: FetchOutcome,
    pub targets: Vec<TargetOutcome>,
}

impl TickReport {
    pub fn status(&self) -> TickStatus {
        match self.fetch {
            FetchOutcome::Failed { .. } => TickStatus::Failed,
            FetchOutcome::Fetched { .. } if self.targets.iter().all(TargetOutcome::is_ok) => {
                TickStatus::Success
            }
            FetchOutcome::Fetched { .. } => TickStatus::Partial,
        }
    }

    /// Whether the fetch produced a batch.
    pub fn fetched(&self) -> bool {
        matches!(self.fetch, FetchOutcome::Fetched { .. })
    }

    /// Targets with a rotation or persist error.
    pub fn failed_targets(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.targets.iter().filter(|t| !t.is_ok())
    }
}
