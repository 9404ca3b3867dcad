use crate::job_controller::queue::AnalysisQueue;
use crate::pipeline::{ingest, IngestError};
use crate::storage::Database;
use actix_web::{web, HttpResponse, Responder};
use common::responses::{ErrorResponse, IngestResponse};
use log::error;

/// HTTP handler for sales ingestion.
///
/// - On success: `200 OK` with an `IngestResponse`.
/// - On a malformed document or invalid product: `400 Bad Request`.
/// - On an unreachable database: `503 Service Unavailable`.
/// - On any other storage failure: `500 Internal Server Error`.
pub async fn process(
    body: web::Bytes,
    db: web::Data<Database>,
    queue: web::Data<AnalysisQueue>,
) -> impl Responder {
    let db = db.get_ref().clone();
    let queue = queue.get_ref().clone();

    let handle = tokio::task::spawn_blocking(move || ingest(&body, &db, &queue));

    match handle.await {
        Ok(Ok(outcome)) => {
            let queued = outcome.task_id.is_some();
            let message = if queued {
                format!(
                    "Data processed: {} products stored for {}, analysis task queued",
                    outcome.records, outcome.date
                )
            } else {
                format!(
                    "Data processed: {} products stored for {}, but the analysis task could not be queued",
                    outcome.records, outcome.date
                )
            };
            HttpResponse::Ok().json(IngestResponse {
                status: "Success".to_string(),
                message,
                task_id: outcome.task_id,
                queued,
            })
        }
        Ok(Err(e)) => error_response(&e),
        Err(join_err) => {
            error!("Ingestion task failed: {}", join_err);
            HttpResponse::InternalServerError().json(ErrorResponse::new(
                "An error occurred during processing",
                Some(join_err.to_string()),
            ))
        }
    }
}

fn error_response(err: &IngestError) -> HttpResponse {
    match err {
        IngestError::MalformedDocument(e) => HttpResponse::BadRequest()
            .json(ErrorResponse::new("Invalid XML format", Some(e.to_string()))),
        IngestError::InvalidProductData { .. } => HttpResponse::BadRequest().json(
            ErrorResponse::new("Invalid product data format", Some(err.to_string())),
        ),
        IngestError::Persistence(e) if e.is_unavailable() => HttpResponse::ServiceUnavailable()
            .json(ErrorResponse::new(
                "Database connection failed. Please try again later.",
                None,
            )),
        IngestError::Persistence(e) => HttpResponse::InternalServerError().json(
            ErrorResponse::new("An error occurred during processing", Some(e.to_string())),
        ),
    }
}
