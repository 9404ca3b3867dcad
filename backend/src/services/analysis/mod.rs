//! Read access to background analysis results.
//!
//! - `GET /api/analysis/status/{task_id}`: Current `JobStatus` of a task queued by
//!   the ingestion endpoint (`Pending`, `InProgress`, `Completed` with the report id,
//!   or `Failed` with its `FailureKind`). Unknown ids answer `404 Not Found`.
//!
//! - `GET /api/analysis/reports/{date}`: Every report stored for a `YYYY-MM-DD`
//!   date, oldest first.

use actix_web::web::{get, scope};
use actix_web::Scope;

mod get_status;
mod reports;

const API_PATH: &str = "/api/analysis";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/status/{task_id}", get().to(get_status::process))
        .route("/reports/{date}", get().to(reports::process))
}
