//! The sales pipeline: document parsing, aggregation, prompt rendering and
//! the ingestion service that ties them to storage and the analysis queue.

pub mod aggregate;
pub mod ingest;
pub mod parser;
pub mod prompt;

pub use ingest::{ingest, IngestError, IngestOutcome};
