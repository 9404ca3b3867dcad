//! Tracks the status of analysis tasks handed to the background worker.
//!
//! Analysis runs outside the request/response cycle of the ingestion
//! endpoint, so its outcome is never returned to the client that submitted
//! the sales document. Instead, every task gets an id and its progress is
//! recorded here, where `/api/analysis/status/{task_id}` can read it.
//!
//! The main components are:
//! - `JobsState`: A clonable, thread-safe struct holding the status of every task.
//!   It is injected into the Actix application state in `main.rs`.
//! - `JobUpdate`: A message used by the queue and the worker to report status changes.
//! - `start_job_updater`: A long-running task that applies `JobUpdate` messages
//!   received on an MPSC channel to the shared `JobsState` and evicts the oldest
//!   finished tasks once more than `history_limit` of them are held.

use common::jobs::JobStatus;
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};
use tokio::sync::{mpsc, RwLock};

/// A thread-safe, shareable container for the status of all analysis tasks.
#[derive(Clone)]
pub struct JobsState {
    /// A map from task id to its latest `JobStatus`.
    ///
    /// Readers are the status endpoint; the only writer is `start_job_updater`.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Sender side of the update channel.
    ///
    /// The queue reports `Pending` through it and the worker reports
    /// `InProgress`, `Completed` and `Failed`, so neither needs write access
    /// to the map.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// Creates an empty state plus the receiver to hand to `start_job_updater`.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

/// A status change for one analysis task.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub job_id: String,
    pub status: JobStatus,
}

/// Applies every `JobUpdate` received on `rx` to the shared map.
///
/// Pending and running tasks are always kept. Of the finished ones only the
/// latest `history_limit` remain; older ids read as unknown afterwards.
///
/// Spawned once in `main.rs`; it ends when all senders are dropped.
pub async fn start_job_updater(
    state: JobsState,
    mut rx: mpsc::Receiver<JobUpdate>,
    history_limit: usize,
) {
    let mut finished: VecDeque<String> = VecDeque::new();

    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        let already_finished = jobs
            .get(&update.job_id)
            .is_some_and(JobStatus::is_finished);
        if update.status.is_finished() && !already_finished {
            finished.push_back(update.job_id.clone());
        }
        jobs.insert(update.job_id, update.status);

        while finished.len() > history_limit {
            if let Some(oldest) = finished.pop_front() {
                jobs.remove(&oldest);
            }
        }
    }
}
