//! Sales document ingestion over HTTP.
//!
//! The provided routes are:
//! - `POST /api/sales/process`: The request body is the raw sales document. Every
//!   product is validated and stored in one transaction, summary statistics are
//!   computed and an analysis task is queued for the background worker. The
//!   response carries the task id, which `GET /api/analysis/status/{task_id}`
//!   accepts. The analysis outcome itself is never part of this response.
//!
//! - `POST /process_sales`: Same handler, kept for clients of the original path.

use actix_web::web::{post, resource, scope};
use actix_web::{Resource, Scope};

pub mod process;

const API_PATH: &str = "/api/sales";
const LEGACY_PATH: &str = "/process_sales";

/// Configures and returns the Actix scope for sales routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/process", post().to(process::process))
}

/// The ingestion endpoint under its original, unscoped path.
pub fn legacy_route() -> Resource {
    resource(LEGACY_PATH).route(post().to(process::process))
}
