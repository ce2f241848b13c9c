use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a compute job, in the platform's wire order.
///
/// The discriminants are the ordinals the job API sends on the wire; reordering
/// the variants breaks decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Unknown = 0,
    Stopped = 1,
    Running = 2,
    Done = 3,
    Failed = 4,
    Cancelled = 5,
    Updated = 6,
    Draining = 7,
    Drained = 8,
    Pending = 9,
    Cancelling = 10,
    Queued = 11,
    ResourceCleaningUp = 12,
}

impl JobState {
    pub const ALL: [JobState; 13] = [
        JobState::Unknown,
        JobState::Stopped,
        JobState::Running,
        JobState::Done,
        JobState::Failed,
        JobState::Cancelled,
        JobState::Updated,
        JobState::Draining,
        JobState::Drained,
        JobState::Pending,
        JobState::Cancelling,
        JobState::Queued,
        JobState::ResourceCleaningUp,
    ];

    pub fn decode(ordinal: i64) -> Result<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or(Error::OutOfRange { ordinal })
    }

    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn name(self) -> &'static str {
        match self {
            JobState::Unknown => "UNKNOWN",
            JobState::Stopped => "STOPPED",
            JobState::Running => "RUNNING",
            JobState::Done => "DONE",
            JobState::Failed => "FAILED",
            JobState::Cancelled => "CANCELLED",
            JobState::Updated => "UPDATED",
            JobState::Draining => "DRAINING",
            JobState::Drained => "DRAINED",
            JobState::Pending => "PENDING",
            JobState::Cancelling => "CANCELLING",
            JobState::Queued => "QUEUED",
            JobState::ResourceCleaningUp => "RESOURCE_CLEANING_UP",
        }
    }

    /// Name as the platform spells it, e.g. `JOB_STATE_RUNNING`.
    pub fn wire_name(self) -> String {
        format!("JOB_STATE_{}", self.name())
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Done
                | JobState::Failed
                | JobState::Cancelled
                | JobState::Updated
                | JobState::Drained
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobIdentity {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub name: String,
    pub state: JobState,
    /// Absent when the platform has not stamped the job yet.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub id: String,
    pub name: String,
    pub state: JobState,
}
