//! Relational persistence of index records, one table per family.

use crate::core::{IndexRecord, IndexUnit, StoreError};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Outcome of one upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertReport {
    pub succeeded: usize,
    pub rejected: usize,
}

/// Why a record was refused before reaching the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordIssue {
    EmptyRoute,
    NonNumericIndex,
    NegativeWeighting,
    DatesOutOfOrder,
}

pub fn validate(record: &IndexRecord) -> Result<(), RecordIssue> {
    if record.route.trim().is_empty() {
        return Err(RecordIssue::EmptyRoute);
    }
    if !record.current_index.is_finite()
        || !record.previous_index.is_finite()
        || !record.change.is_finite()
    {
        return Err(RecordIssue::NonNumericIndex);
    }
    if record.weighting.is_nan() || record.weighting < 0.0 {
        return Err(RecordIssue::NegativeWeighting);
    }
    if record.current_date < record.previous_date {
        return Err(RecordIssue::DatesOutOfOrder);
    }
    Ok(())
}

/// Handle to the index database. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct IndexStore {
    pool: SqlitePool,
}

impl IndexStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Persistence(e.into()))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        info!("Opened index store at {}", path.display());
        Ok(Self { pool })
    }

    /// A private in-memory database. A single connection keeps every query
    /// on the same database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub fn table_name(family: &str) -> Result<String, StoreError> {
        let family = family.to_lowercase();
        let valid = !family.is_empty()
            && family
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if valid {
            Ok(format!("index_{family}"))
        } else {
            Err(StoreError::InvalidFamily(family))
        }
    }

    fn create_table_sql(table: &str) -> String {
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                route TEXT NOT NULL,
                unit TEXT NOT NULL,
                weighting REAL NOT NULL DEFAULT 0,
                previous_index REAL NOT NULL,
                current_index REAL NOT NULL,
                change REAL NOT NULL,
                previous_date TEXT NOT NULL,
                index_date TEXT NOT NULL,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(route, index_date)
            )
            "#
        )
    }

    /// Inserts or supersedes `records` in one transaction.
    ///
    /// Invalid records are skipped and counted without aborting the batch.
    /// Any database failure rolls the whole batch back.
    pub async fn upsert(
        &self,
        family: &str,
        records: &[IndexRecord],
    ) -> Result<UpsertReport, StoreError> {
        let table = Self::table_name(family)?;
        let mut report = UpsertReport::default();
        let mut tx = self.pool.begin().await?;

        sqlx::query(&Self::create_table_sql(&table))
            .execute(&mut *tx)
            .await?;

        let statement = format!(
            r#"
            INSERT INTO {table} (
                route, unit, weighting, previous_index, current_index, change,
                previous_date, index_date, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(route, index_date) DO UPDATE SET
                unit = excluded.unit,
                weighting = excluded.weighting,
                previous_index = excluded.previous_index,
                current_index = excluded.current_index,
                change = excluded.change,
                previous_date = excluded.previous_date,
                updated_at = CURRENT_TIMESTAMP
            "#
        );

        for record in records {
            if let Err(issue) = validate(record) {
                warn!(
                    "Skipping invalid {} record '{}': {:?}",
                    family, record.route, issue
                );
                report.rejected += 1;
                continue;
            }
            sqlx::query(&statement)
                .bind(record.route.trim())
                .bind(record.unit.as_str())
                .bind(record.weighting)
                .bind(record.previous_index)
                .bind(record.current_index)
                .bind(record.change)
                .bind(record.previous_date)
                .bind(record.current_date)
                .execute(&mut *tx)
                .await?;
            report.succeeded += 1;
        }

        tx.commit().await?;
        info!(
            "Stored {} {} record(s), rejected {}",
            report.succeeded, family, report.rejected
        );
        Ok(report)
    }

    async fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    /// Most recent record whose route contains the first candidate that
    /// matches anything, trying candidates in order.
    pub async fn latest_by_route(
        &self,
        family: &str,
        candidates: &[String],
    ) -> Result<Option<IndexRecord>, StoreError> {
        let table = Self::table_name(family)?;
        if !self.table_exists(&table).await? {
            debug!("No {} table yet", table);
            return Ok(None);
        }

        let statement = format!(
            r#"
            SELECT route, unit, weighting, previous_index, current_index, change,
                   previous_date, index_date
            FROM {table}
            WHERE lower(route) LIKE '%' || lower(?) || '%' ESCAPE '\'
            ORDER BY index_date DESC, updated_at DESC
            LIMIT 1
            "#
        );

        for candidate in candidates.iter().filter(|c| !c.trim().is_empty()) {
            let row = sqlx::query(&statement)
                .bind(escape_like(candidate.trim()))
                .fetch_optional(&self.pool)
                .await?;
            if let Some(row) = row {
                let record = record_from_row(&table, &row)?;
                debug!("Candidate '{}' matched {} route '{}'", candidate, family, record.route);
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Every record of the most recent reading date.
    pub async fn snapshot(&self, family: &str) -> Result<Vec<IndexRecord>, StoreError> {
        let table = Self::table_name(family)?;
        if !self.table_exists(&table).await? {
            return Ok(Vec::new());
        }

        let statement = format!(
            r#"
            SELECT route, unit, weighting, previous_index, current_index, change,
                   previous_date, index_date
            FROM {table}
            WHERE index_date = (SELECT MAX(index_date) FROM {table})
            ORDER BY weighting DESC, route
            "#
        );
        let rows = sqlx::query(&statement).fetch_all(&self.pool).await?;
        rows.iter().map(|row| record_from_row(&table, row)).collect()
    }
}

fn escape_like(candidate: &str) -> String {
    candidate
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn record_from_row(table: &str, row: &SqliteRow) -> Result<IndexRecord, StoreError> {
    let corrupt = |reason: String| StoreError::CorruptRow {
        table: table.to_string(),
        reason,
    };
    let unit: String = row.try_get("unit")?;
    let previous_date: NaiveDate = row.try_get("previous_date")?;
    let current_date: NaiveDate = row.try_get("index_date")?;

    Ok(IndexRecord {
        route: row.try_get("route")?,
        unit: IndexUnit::from_str(&unit).map_err(|e| corrupt(e.to_string()))?,
        weighting: row.try_get("weighting")?,
        previous_index: row.try_get("previous_index")?,
        current_index: row.try_get("current_index")?,
        change: row.try_get("change")?,
        previous_date,
        current_date,
    })
}
