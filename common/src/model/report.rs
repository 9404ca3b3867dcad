use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A language-model analysis persisted for one reporting date.
///
/// Several reports may exist for the same date: every analysis task that
/// completes appends a new row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Row id assigned by the database, `None` until stored.
    pub id: Option<i64>,
    pub date: NaiveDate,
    /// The exact prompt that was sent to the model.
    pub prompt: String,
    /// The raw text returned by the model.
    pub response: String,
}
