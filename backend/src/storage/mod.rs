//! SQLite persistence for sales lines and analysis reports.
//!
//! Both tables are append-only. A [`Database`] only remembers where the file
//! lives; every request and every analysis task opens its own connection and
//! drops it when done.

pub mod reports;
pub mod sales;

use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sales_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    product_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    quantity INTEGER NOT NULL,
    price REAL NOT NULL,
    category TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_sales_data_product_id ON sales_data (product_id);
CREATE INDEX IF NOT EXISTS ix_sales_data_date ON sales_data (date);
CREATE TABLE IF NOT EXISTS llm_analysis_result (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    prompt TEXT NOT NULL,
    response TEXT NOT NULL
);
";

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The database file could not be opened at all.
    #[error("database unavailable: {0}")]
    Unavailable(#[source] rusqlite::Error),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl PersistenceError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, PersistenceError::Unavailable(_))
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a fresh connection. Failing to open the file is reported as
    /// [`PersistenceError::Unavailable`].
    pub fn connect(&self) -> Result<Connection, PersistenceError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(classify_open_error)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Creates the tables if they do not exist yet.
    pub fn initialize(&self) -> Result<(), PersistenceError> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }
}

fn classify_open_error(err: rusqlite::Error) -> PersistenceError {
    match err.sqlite_error_code() {
        Some(ErrorCode::CannotOpen) | Some(ErrorCode::NotADatabase) | None => {
            PersistenceError::Unavailable(err)
        }
        Some(_) => PersistenceError::Database(err),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use tempfile::TempDir;

    /// An initialized database living in a temporary directory. Keep the
    /// `TempDir` alive for as long as the database is used.
    pub fn temp_database() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("sales.sqlite"));
        db.initialize().unwrap();
        (dir, db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_idempotent() {
        let (_dir, db) = test_support::temp_database();
        db.initialize().unwrap();
        let conn = db.connect().unwrap();
        assert_eq!(sales::count_sales(&conn).unwrap(), 0);
        assert_eq!(reports::count_reports(&conn).unwrap(), 0);
    }

    #[test]
    fn missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("no/such/dir/sales.sqlite"));
        let err = db.connect().unwrap_err();
        assert!(err.is_unavailable(), "unexpected error: {err}");
    }
}
