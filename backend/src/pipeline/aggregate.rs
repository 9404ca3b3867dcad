//! Summary statistics for one day of sales.

use common::model::sale::SaleRecord;
use thiserror::Error;

/// Number of best sellers reported per day.
pub const TOP_PRODUCTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    pub total_revenue: f64,
    /// Up to [`TOP_PRODUCTS`] `(name, quantity)` pairs, best seller first.
    pub top_products: Vec<(String, i64)>,
    /// Summed quantity per category, in the order categories first appeared.
    pub category_totals: Vec<(String, i64)>,
}

/// A category's summed quantity no longer fits in an `i64`.
#[derive(Debug, Error, PartialEq)]
#[error("total quantity for category '{category}' overflows")]
pub struct QuantityOverflow {
    pub category: String,
}

/// Running totals fed one record at a time while a submission is staged.
#[derive(Debug, Default)]
pub struct Aggregator {
    total_revenue: f64,
    products: Vec<(String, i64)>,
    category_totals: Vec<(String, i64)>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one record. On overflow the aggregator is left unchanged.
    pub fn push(&mut self, record: &SaleRecord) -> Result<(), QuantityOverflow> {
        match self
            .category_totals
            .iter_mut()
            .find(|(category, _)| *category == record.category)
        {
            Some((_, total)) => {
                *total = total
                    .checked_add(record.quantity)
                    .ok_or_else(|| QuantityOverflow {
                        category: record.category.clone(),
                    })?
            }
            None => self
                .category_totals
                .push((record.category.clone(), record.quantity)),
        }

        self.total_revenue += record.revenue();
        self.products.push((record.name.clone(), record.quantity));
        Ok(())
    }

    pub fn finish(self) -> AggregationResult {
        let mut top_products = self.products;
        // best sellers first, ties in submission order
        top_products.sort_by(|a, b| b.1.cmp(&a.1));
        top_products.truncate(TOP_PRODUCTS);

        AggregationResult {
            total_revenue: self.total_revenue,
            top_products,
            category_totals: self.category_totals,
        }
    }
}

pub fn aggregate<'a, I>(records: I) -> Result<AggregationResult, QuantityOverflow>
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    let mut aggregator = Aggregator::new();
    for record in records {
        aggregator.push(record)?;
    }
    Ok(aggregator.finish())
}
