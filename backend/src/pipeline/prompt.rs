use crate::pipeline::aggregate::TOP_PRODUCTS;

/// Renders the analysis request sent to the language model.
///
/// Only the best sellers that actually exist are listed, so days with fewer
/// than three products render without gaps.
pub fn build_prompt(
    date: &str,
    total_revenue: f64,
    top_products: &[(String, i64)],
    category_totals: &[(String, i64)],
) -> String {
    let best_sellers = if top_products.is_empty() {
        "   - no products were sold".to_string()
    } else {
        top_products
            .iter()
            .map(|(name, quantity)| format!("   - {name}: {quantity} units"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let categories = if category_totals.is_empty() {
        "no sales recorded".to_string()
    } else {
        category_totals
            .iter()
            .map(|(category, quantity)| format!("{category}: {quantity}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "Sales data for {date}:

1. Total revenue: {total_revenue} (across all products).
2. Top {TOP_PRODUCTS} products by units sold:
{best_sellers}
3. Units sold per category:
   {categories}

Analyze this data and write a detailed report with recommendations for improving sales:
- Discuss which products and categories performed best.
- Point out which products or categories have room to improve.
- Recommend ways to raise sales in the least active categories or products.
- Suggest actions that could increase total revenue based on this data.

Please present the report as a clear list of recommendations."
    )
}
