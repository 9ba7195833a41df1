//! SQLite-based interval storage.
//!
//! One table, `intervals`, holds the append-only history. `AUTOINCREMENT`
//! keeps ids from ever being reused, even after the highest row is gone.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::{CoreError, DatabaseError, Result};
use crate::interval::{Category, Interval};

use super::Repository;

const COLUMNS: &str = "id, start_time, planned_duration_ms, actual_duration_ms, category, state";

/// SQLite database for interval history.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteRepository {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
            path: Some(path),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        db.migrate()?;
        Ok(db)
    }

    /// File backing this store, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CoreError::Database(DatabaseError::Poisoned))
    }

    fn migrate(&self) -> Result<()> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS intervals (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                start_time          TEXT,
                planned_duration_ms INTEGER NOT NULL,
                actual_duration_ms  INTEGER NOT NULL DEFAULT 0,
                category            TEXT NOT NULL,
                state               TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_intervals_category ON intervals(category);",
        )?;
        Ok(())
    }
}

impl Repository for SqliteRepository {
    fn create(&self, interval: &Interval) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO intervals (start_time, planned_duration_ms, actual_duration_ms, category, state)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                interval.start_time.map(|t| t.to_rfc3339()),
                to_ms(interval.planned_duration),
                to_ms(interval.actual_duration),
                interval.category.as_str(),
                interval.state.as_str(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, category = %interval.category, "interval row inserted");
        Ok(id)
    }

    fn update(&self, interval: &Interval) -> Result<()> {
        let changed = self.conn()?.execute(
            "UPDATE intervals
             SET start_time = ?1, planned_duration_ms = ?2, actual_duration_ms = ?3,
                 category = ?4, state = ?5
             WHERE id = ?6",
            params![
                interval.start_time.map(|t| t.to_rfc3339()),
                to_ms(interval.planned_duration),
                to_ms(interval.actual_duration),
                interval.category.as_str(),
                interval.state.as_str(),
                interval.id,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::InvalidId(interval.id));
        }
        Ok(())
    }

    fn by_id(&self, id: i64) -> Result<Interval> {
        let row = self
            .conn()?
            .query_row(
                &format!("SELECT {COLUMNS} FROM intervals WHERE id = ?1"),
                params![id],
                IntervalRow::from_row,
            )
            .optional()?;
        row.ok_or(CoreError::InvalidId(id))?.into_interval()
    }

    fn last(&self) -> Result<Interval> {
        let row = self
            .conn()?
            .query_row(
                &format!("SELECT {COLUMNS} FROM intervals ORDER BY id DESC LIMIT 1"),
                [],
                IntervalRow::from_row,
            )
            .optional()?;
        row.ok_or(CoreError::NoIntervals)?.into_interval()
    }

    fn breaks(&self, n: usize) -> Result<Vec<Interval>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM intervals
             WHERE category IN (?1, ?2)
             ORDER BY id DESC
             LIMIT ?3"
        ))?;
        let limit = i64::try_from(n).unwrap_or(i64::MAX);
        let rows = stmt.query_map(
            params![
                Category::ShortBreak.as_str(),
                Category::LongBreak.as_str(),
                limit
            ],
            IntervalRow::from_row,
        )?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_interval()?);
        }
        Ok(out)
    }
}

/// Raw column values, validated after the statement is done with the row.
struct IntervalRow {
    id: i64,
    start_time: Option<String>,
    planned_ms: i64,
    actual_ms: i64,
    category: String,
    state: String,
}

impl IntervalRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            start_time: row.get(1)?,
            planned_ms: row.get(2)?,
            actual_ms: row.get(3)?,
            category: row.get(4)?,
            state: row.get(5)?,
        })
    }

    fn into_interval(self) -> Result<Interval> {
        let id = self.id;
        let corrupt = |message: String| CoreError::Database(DatabaseError::Corrupt { id, message });

        let start_time = self
            .start_time
            .map(|s| DateTime::parse_from_rfc3339(&s).map(|t| t.with_timezone(&Utc)))
            .transpose()
            .map_err(|e| corrupt(format!("start_time: {e}")))?;

        Ok(Interval {
            id,
            start_time,
            planned_duration: from_ms(self.planned_ms),
            actual_duration: from_ms(self.actual_ms),
            category: self.category.parse().map_err(corrupt)?,
            state: self.state.parse().map_err(corrupt)?,
        })
    }
}

fn to_ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

fn from_ms(ms: i64) -> Duration {
    Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}
