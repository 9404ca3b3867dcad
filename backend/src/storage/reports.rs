use chrono::NaiveDate;
use common::model::report::AnalysisReport;
use rusqlite::{params, Connection};

/// Appends a report and returns its row id. Reports are never deduplicated.
pub fn insert_report(conn: &Connection, report: &AnalysisReport) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO llm_analysis_result (date, prompt, response) VALUES (?1, ?2, ?3)",
        params![report.date, report.prompt, report.response],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn count_reports(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM llm_analysis_result", [], |row| {
        row.get(0)
    })
}

pub fn reports_for_date(
    conn: &Connection,
    date: NaiveDate,
) -> rusqlite::Result<Vec<AnalysisReport>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, prompt, response FROM llm_analysis_result WHERE date = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![date], |row| {
        Ok(AnalysisReport {
            id: Some(row.get(0)?),
            date: row.get(1)?,
            prompt: row.get(2)?,
            response: row.get(3)?,
        })
    })?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::temp_database;

    #[test]
    fn same_date_appends_separate_rows() {
        let (_dir, db) = temp_database();
        let conn = db.connect().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let report = AnalysisReport {
            id: None,
            date,
            prompt: "prompt".to_string(),
            response: "response".to_string(),
        };

        let first = insert_report(&conn, &report).unwrap();
        let second = insert_report(&conn, &report).unwrap();
        assert_ne!(first, second);

        let stored = reports_for_date(&conn, date).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, Some(first));
        assert_eq!(stored[1].response, "response");
    }
}
