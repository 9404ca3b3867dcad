//! # Analysis Worker
//!
//! Consumes the analysis queue filled by the ingestion endpoint. For every
//! `(date, prompt)` task it asks the language model for a report and appends
//! the answer to `llm_analysis_result`.
//!
//! ## Workflow:
//!
//! 1.  **Dispatch**: `AnalysisWorker::run` drains the task channel and spawns one
//!     Tokio task per message, at most `concurrency` of them at a time.
//!
//! 2.  **Execution**: `execute` opens a database connection for the task, calls
//!     the model (retrying transient failures when configured to) and stores the
//!     report on a blocking thread. The connection is dropped on every exit path.
//!
//! 3.  **Classification**: `handle` turns the outcome into a `JobStatus`, logs
//!     failures with a message specific to their `FailureKind` and publishes the
//!     status on the job update channel. Nothing is returned to the client that
//!     submitted the data, and a failed task is never re-queued.

use crate::config::LlmConfig;
use crate::job_controller::queue::AnalysisTask;
use crate::job_controller::state::JobUpdate;
use crate::llm::{CompletionRequest, LanguageModel, LlmError};
use crate::storage::{reports, Database, PersistenceError};
use common::jobs::{FailureKind, JobStatus};
use common::model::report::AnalysisReport;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};

/// Upper bound on the delay between two model calls.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// A worker-side failure, tagged with its cause.
#[derive(Debug, Error)]
#[error("{detail}")]
pub struct AnalysisFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl AnalysisFailure {
    fn other(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Other,
            detail: detail.into(),
        }
    }
}

impl From<LlmError> for AnalysisFailure {
    fn from(err: LlmError) -> Self {
        let kind = match &err {
            LlmError::QuotaExceeded(_) => FailureKind::QuotaExceeded,
            LlmError::AccessDenied(_) => FailureKind::AccessDenied,
            LlmError::Other { .. } => FailureKind::Other,
        };
        Self {
            kind,
            detail: err.to_string(),
        }
    }
}

impl From<PersistenceError> for AnalysisFailure {
    fn from(err: PersistenceError) -> Self {
        Self::other(err.to_string())
    }
}

/// How the worker calls the model.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub max_attempts: u32,
    /// Delay before the second attempt, doubled for each following one.
    pub base_backoff: Duration,
}

impl From<&LlmConfig> for CompletionSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            max_tokens: config.max_tokens,
            max_attempts: config.max_attempts.max(1),
            base_backoff: Duration::from_secs(1),
        }
    }
}

pub struct AnalysisWorker {
    db: Database,
    model: Arc<dyn LanguageModel>,
    settings: CompletionSettings,
    updates: mpsc::Sender<JobUpdate>,
}

impl AnalysisWorker {
    pub fn new(
        db: Database,
        model: Arc<dyn LanguageModel>,
        settings: CompletionSettings,
        updates: mpsc::Sender<JobUpdate>,
    ) -> Self {
        Self {
            db,
            model,
            settings,
            updates,
        }
    }

    /// Drains `tasks` until every sender is dropped.
    pub async fn run(self: Arc<Self>, mut tasks: mpsc::Receiver<AnalysisTask>, concurrency: usize) {
        let permits = Arc::new(Semaphore::new(concurrency.max(1)));
        info!("Analysis worker started with {} slots", concurrency.max(1));

        while let Some(task) = tasks.recv().await {
            let permit = match permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let worker = self.clone();
            tokio::spawn(async move {
                worker.handle(task).await;
                drop(permit);
            });
        }
        info!("Analysis queue closed, worker stopping");
    }

    /// Runs one task to a terminal status. Never fails.
    pub async fn handle(&self, task: AnalysisTask) -> JobStatus {
        self.publish(&task.task_id, JobStatus::InProgress).await;

        let status = match self.execute(&task).await {
            Ok(report_id) => {
                info!(
                    "Analysis for {} stored as report {} (task {})",
                    task.date, report_id, task.task_id
                );
                JobStatus::Completed(report_id)
            }
            Err(failure) => {
                error!("{}", failure_message(&task, &failure));
                JobStatus::Failed(failure.kind, failure.detail)
            }
        };

        self.publish(&task.task_id, status.clone()).await;
        status
    }

    /// Calls the model and stores the report, returning the new report id.
    pub async fn execute(&self, task: &AnalysisTask) -> Result<i64, AnalysisFailure> {
        let conn = self.db.connect()?;
        info!("Starting analysis for {} (task {})", task.date, task.task_id);

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            system: self.settings.system_prompt.clone(),
            prompt: task.prompt.clone(),
            max_tokens: self.settings.max_tokens,
        };
        let response = self.complete_with_retry(&request).await?;
        info!("Model response received for {}", task.date);

        let report = AnalysisReport {
            id: None,
            date: task.date,
            prompt: task.prompt.clone(),
            response,
        };
        tokio::task::spawn_blocking(move || reports::insert_report(&conn, &report))
            .await
            .map_err(|e| AnalysisFailure::other(format!("report writer panicked: {e}")))?
            .map_err(|e| AnalysisFailure::from(PersistenceError::from(e)))
    }

    async fn complete_with_retry(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let mut attempt = 1;
        loop {
            match self.model.complete(request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.settings.max_attempts => {
                    let delay = self
                        .settings
                        .base_backoff
                        .saturating_mul(2_u32.saturating_pow(attempt - 1))
                        .min(MAX_BACKOFF);
                    warn!(
                        "Model call attempt {} of {} failed: {}. Retrying in {:?}",
                        attempt, self.settings.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn publish(&self, task_id: &str, status: JobStatus) {
        let _ = self
            .updates
            .send(JobUpdate {
                job_id: task_id.to_string(),
                status,
            })
            .await;
    }
}

/// The log line for a failed task, worded per `FailureKind`.
fn failure_message(task: &AnalysisTask, failure: &AnalysisFailure) -> String {
    match failure.kind {
        FailureKind::QuotaExceeded => format!(
            "No model response for {} (task {}): insufficient account balance or rate limited: {}",
            task.date, task.task_id, failure.detail
        ),
        FailureKind::AccessDenied => format!(
            "No model response for {} (task {}): requests are blocked, route them through SOCKS5_URL: {}",
            task.date, task.task_id, failure.detail
        ),
        FailureKind::Other => format!(
            "Analysis task {} for {} failed: {}",
            task.task_id, task.date, failure.detail
        ),
    }
}
