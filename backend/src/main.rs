use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use sales_backend::config::AppConfig;
use sales_backend::job_controller::queue::AnalysisQueue;
use sales_backend::job_controller::state::{self, JobsState};
use sales_backend::job_controller::worker::{AnalysisWorker, CompletionSettings};
use sales_backend::llm::OpenAiClient;
use sales_backend::services;
use sales_backend::storage::Database;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let db = Database::new(&config.database_path);
    db.initialize().map_err(|e| {
        error!("Could not initialize {}: {}", db.path().display(), e);
        io::Error::other(e.to_string())
    })?;

    // Job status tracking
    let (jobs_state, updates_rx) = JobsState::new(config.queue_capacity * 4);
    tokio::spawn(state::start_job_updater(
        jobs_state.clone(),
        updates_rx,
        config.job_history_limit,
    ));

    // Analysis queue and worker
    let (task_tx, task_rx) = mpsc::channel(config.queue_capacity);
    let queue = AnalysisQueue::new(task_tx, jobs_state.tx.clone());
    let model = OpenAiClient::new(&config.llm)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    let worker = Arc::new(AnalysisWorker::new(
        db.clone(),
        Arc::new(model),
        CompletionSettings::from(&config.llm),
        jobs_state.tx.clone(),
    ));
    tokio::spawn(worker.run(task_rx, config.worker_concurrency));

    info!(
        "Server running at http://{}:{} (database {})",
        config.host,
        config.port,
        db.path().display()
    );

    let max_document_bytes = config.max_document_bytes;
    HttpServer::new(move || {
        App::new()
            .app_data(web::PayloadConfig::new(max_document_bytes))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(queue.clone()))
            .app_data(web::Data::new(jobs_state.clone()))
            .service(services::sales::configure_routes())
            .service(services::sales::legacy_route())
            .service(services::analysis::configure_routes())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
