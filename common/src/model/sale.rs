use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One product line of a single day's sales submission.
///
/// Records are built by the backend from the `<product>` elements of an
/// uploaded document and stored once in the `sales_data` table. They are
/// never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    /// The reporting date of the submission this line belongs to.
    pub date: NaiveDate,
    pub product_id: i64,
    pub name: String,
    /// Units sold. Always non-negative.
    pub quantity: i64,
    /// Unit price. Always finite and non-negative.
    pub price: f64,
    pub category: String,
}

impl SaleRecord {
    /// Revenue contributed by this line (`quantity * price`).
    pub fn revenue(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}
