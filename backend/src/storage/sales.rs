use common::model::sale::SaleRecord;
use rusqlite::{params, Connection};

/// Stages one sale line. Callers pass a transaction (which derefs to a
/// `Connection`) so that a whole submission commits or rolls back together.
pub fn insert_sale(conn: &Connection, record: &SaleRecord) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO sales_data (date, product_id, name, quantity, price, category)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.date,
            record.product_id,
            record.name,
            record.quantity,
            record.price,
            record.category
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn count_sales(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM sales_data", [], |row| row.get(0))
}
