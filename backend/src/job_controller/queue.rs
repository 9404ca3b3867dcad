//! Hand-off point between the ingestion path and the analysis worker.

use crate::job_controller::state::JobUpdate;
use chrono::NaiveDate;
use common::jobs::{FailureKind, JobStatus};
use log::warn;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// The unit of work consumed by the analysis worker.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisTask {
    pub task_id: String,
    pub date: NaiveDate,
    pub prompt: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error("analysis queue is full")]
    Full,
    #[error("analysis worker is not running")]
    Closed,
}

/// Producer side of the analysis queue.
///
/// `submit` never waits: the caller gets a task id back as soon as the task
/// sits in the channel, whatever later happens to it.
#[derive(Clone)]
pub struct AnalysisQueue {
    tasks: mpsc::Sender<AnalysisTask>,
    updates: mpsc::Sender<JobUpdate>,
}

impl AnalysisQueue {
    pub fn new(tasks: mpsc::Sender<AnalysisTask>, updates: mpsc::Sender<JobUpdate>) -> Self {
        Self { tasks, updates }
    }

    pub fn submit(&self, date: NaiveDate, prompt: String) -> Result<String, DispatchError> {
        let task_id = Uuid::new_v4().to_string();

        // Pending goes first so the worker's own updates always land after it.
        if let Err(e) = self.updates.try_send(JobUpdate {
            job_id: task_id.clone(),
            status: JobStatus::Pending,
        }) {
            warn!("Could not record pending status for task {}: {}", task_id, e);
        }

        let task = AnalysisTask {
            task_id: task_id.clone(),
            date,
            prompt,
        };
        if let Err(e) = self.tasks.try_send(task) {
            let err = match e {
                TrySendError::Full(_) => DispatchError::Full,
                TrySendError::Closed(_) => DispatchError::Closed,
            };
            let _ = self.updates.try_send(JobUpdate {
                job_id: task_id,
                status: JobStatus::Failed(FailureKind::Other, err.to_string()),
            });
            return Err(err);
        }

        Ok(task_id)
    }
}
