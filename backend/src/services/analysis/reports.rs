use crate::pipeline::parser::parse_date;
use crate::storage::{reports, Database, PersistenceError};
use actix_web::{web, HttpResponse, Responder};
use common::responses::ErrorResponse;
use log::error;

pub(crate) async fn process(date: web::Path<String>, db: web::Data<Database>) -> impl Responder {
    let raw = date.into_inner();
    let Some(date) = parse_date(&raw) else {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Invalid date",
            Some(format!("expected YYYY-MM-DD, got '{raw}'")),
        ));
    };

    let db = db.get_ref().clone();
    let result = tokio::task::spawn_blocking(move || {
        let conn = db.connect()?;
        reports::reports_for_date(&conn, date).map_err(PersistenceError::from)
    })
    .await;

    match result {
        Ok(Ok(stored)) => HttpResponse::Ok().json(stored),
        Ok(Err(e)) if e.is_unavailable() => HttpResponse::ServiceUnavailable().json(
            ErrorResponse::new("Database connection failed. Please try again later.", None),
        ),
        Ok(Err(e)) => {
            error!("Failed to load reports for {}: {}", date, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("Failed to load reports", Some(e.to_string())))
        }
        Err(join_err) => HttpResponse::InternalServerError().json(ErrorResponse::new(
            "Failed to load reports",
            Some(join_err.to_string()),
        )),
    }
}
