use serde::{Deserialize, Serialize};

/// Cause of a failed analysis task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The model provider rejected the call for quota or rate-limit reasons.
    QuotaExceeded,
    /// The model provider refused access (e.g. region or policy block).
    AccessDenied,
    /// Network, malformed response, persistence or anything else.
    Other,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    InProgress,
    /// Holds the id of the stored report.
    Completed(i64),
    Failed(FailureKind, String),
}

impl JobStatus {
    /// `Completed` or `Failed`; no further update follows.
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(..))
    }
}
