//! Synchronous ingestion of one sales document.
//!
//! `ingest` parses and types every product before the database is touched,
//! writes all lines in a single transaction and only then queues the analysis
//! task, so a queued task always refers to committed data. Any invalid product
//! rejects the whole submission.

use crate::job_controller::queue::AnalysisQueue;
use crate::pipeline::aggregate::Aggregator;
use crate::pipeline::parser::{self, DocumentError, DATE_FORMAT};
use crate::pipeline::prompt::build_prompt;
use crate::storage::{sales, Database, PersistenceError};
use chrono::NaiveDate;
use common::model::sale::SaleRecord;
use log::{debug, error, info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0}")]
    MalformedDocument(#[from] DocumentError),
    #[error("{}", describe_invalid(.index, .field, .value))]
    InvalidProductData {
        /// 1-based position of the product, `None` for document-level fields.
        index: Option<usize>,
        field: &'static str,
        /// The offending text, `None` when it is missing.
        value: Option<String>,
    },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

fn describe_invalid(index: &Option<usize>, field: &str, value: &Option<String>) -> String {
    let problem = match value {
        Some(value) => format!("invalid {field} value '{value}'"),
        None => format!("missing {field}"),
    };
    match index {
        Some(index) => format!("product #{index}: {problem}"),
        None => problem,
    }
}

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub date: NaiveDate,
    pub records: usize,
    /// `None` when the analysis task could not be queued.
    pub task_id: Option<String>,
}

pub fn ingest(
    raw: &[u8],
    db: &Database,
    queue: &AnalysisQueue,
) -> Result<IngestOutcome, IngestError> {
    let document = parser::parse(raw).inspect_err(|e| warn!("Rejected sales document: {}", e))?;

    let date = parser::parse_date(&document.date).ok_or_else(|| IngestError::InvalidProductData {
        index: None,
        field: "date",
        value: Some(document.date.clone()),
    })?;

    let mut aggregator = Aggregator::new();
    let mut records: Vec<SaleRecord> = Vec::with_capacity(document.products.len());
    for (i, product) in document.products.into_iter().enumerate() {
        let reject = |field: &'static str, value: Option<String>| {
            let err = IngestError::InvalidProductData {
                index: Some(i + 1),
                field,
                value,
            };
            warn!("Rejected sales document for {}: {}", date, err);
            err
        };
        let record = product
            .into_record(date)
            .map_err(|invalid| reject(invalid.field, invalid.value))?;
        aggregator
            .push(&record)
            .map_err(|_| reject("quantity", Some(record.quantity.to_string())))?;
        debug!("Processed product: {}", record.name);
        records.push(record);
    }

    let aggregation = aggregator.finish();
    let prompt = build_prompt(
        &date.format(DATE_FORMAT).to_string(),
        aggregation.total_revenue,
        &aggregation.top_products,
        &aggregation.category_totals,
    );

    store(db, &records).inspect_err(|e| error!("Failed to store sales for {}: {}", date, e))?;
    info!("Stored {} sales lines for {}", records.len(), date);

    let task_id = match queue.submit(date, prompt) {
        Ok(task_id) => {
            info!("Queued analysis task {} for {}", task_id, date);
            Some(task_id)
        }
        Err(e) => {
            error!("Analysis for {} was not queued: {}", date, e);
            None
        }
    };

    Ok(IngestOutcome {
        date,
        records: records.len(),
        task_id,
    })
}

fn store(db: &Database, records: &[SaleRecord]) -> Result<(), PersistenceError> {
    let mut conn = db.connect()?;
    let tx = conn.transaction()?;
    for record in records {
        sales::insert_sale(&tx, record)?;
    }
    tx.commit()?;
    Ok(())
}
