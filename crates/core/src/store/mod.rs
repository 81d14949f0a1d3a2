//! SQLite persistence and the transaction-scoped unit of work.
//!
//! Every workflow runs inside exactly one [`UnitOfWork`]. Each unit of work
//! owns its own connection, so concurrent workflows only ever coordinate
//! through SQLite's write lock. A unit of work that is dropped without
//! [`UnitOfWork::commit`] rolls back, including when unwinding from a panic.

mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Handle to the SQLite database file.
///
/// Cheap to clone; connections are opened per unit of work.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    /// Open the database at `path`, creating the file and tables if needed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::with_busy_timeout(path, Duration::from_secs(5))
    }

    /// Open the database with a custom wait for the write lock.
    pub fn with_busy_timeout(path: &Path, busy_timeout: Duration) -> Result<Self, StoreError> {
        let db = Self {
            path: path.to_path_buf(),
            busy_timeout,
        };

        let conn = db.connect()?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        conn.execute_batch(schema::SCHEMA)?;

        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// How long a writer waits for the write lock before failing.
    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }

    /// Start a read-write unit of work.
    ///
    /// Takes the write lock up front (`BEGIN IMMEDIATE`), so a second writer
    /// blocks here until the first commits or rolls back.
    pub fn begin(&self) -> Result<UnitOfWork, StoreError> {
        let conn = self.connect()?;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(UnitOfWork {
            conn,
            finished: false,
        })
    }

    /// [`Database::begin`] for async callers.
    ///
    /// Waiting for the write lock sleeps the calling thread for up to the busy
    /// timeout, so the wait runs on tokio's blocking pool.
    pub async fn begin_async(&self) -> Result<UnitOfWork, StoreError> {
        let db = self.clone();
        tokio::task::spawn_blocking(move || db.begin())
            .await
            .map_err(|e| StoreError::Database(format!("unit of work task failed: {}", e)))?
    }

    /// Start a unit of work that only reads.
    pub fn read(&self) -> Result<UnitOfWork, StoreError> {
        let conn = self.connect()?;
        conn.execute_batch("BEGIN DEFERRED")?;
        Ok(UnitOfWork {
            conn,
            finished: false,
        })
    }
}

/// A single database transaction.
///
/// Repositories borrow the unit of work, so everything they do commits or
/// rolls back together.
pub struct UnitOfWork {
    conn: Connection,
    finished: bool,
}

impl UnitOfWork {
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Commit all changes made through this unit of work.
    pub fn commit(mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }

    /// Discard all changes made through this unit of work.
    pub fn rollback(mut self) -> Result<(), StoreError> {
        self.finished = true;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %e, "Failed to roll back unit of work");
            }
        }
    }
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("invalid timestamp {:?}: {}", raw, e)))
}

/// Error for a column whose stored text does not decode.
pub(crate) fn corrupt_column(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(StoreError::Corrupt(message)))
}

pub(crate) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|e| corrupt_column(idx, e.to_string()))
}

pub(crate) fn optional_timestamp_column(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.as_deref()
        .map(|s| parse_timestamp(s).map_err(|e| corrupt_column(idx, e.to_string())))
        .transpose()
}

pub(crate) fn optional_date_column(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.as_deref()
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| corrupt_column(idx, format!("invalid date {:?}: {}", s, e)))
        })
        .transpose()
}

pub(crate) fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
