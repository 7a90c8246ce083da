//! Database operations for `crawl_runs`.
//!
//! A run moves `queued → running → succeeded | failed`. Each transition is a
//! guarded `UPDATE … WHERE status = <expected>`, so an out-of-order call
//! surfaces as [`DbError::InvalidCrawlRunTransition`] instead of silently
//! rewriting history.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const CRAWL_RUN_COLUMNS: &str = "id, public_id, trigger_source, status, started_at, completed_at, \
     regions_total, regions_failed, records_collected, records_saved, error_message, created_at";

/// A row from the `crawl_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CrawlRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub regions_total: i32,
    pub regions_failed: i32,
    pub records_collected: i32,
    pub records_saved: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Counters recorded when a run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlRunCounts {
    pub regions_total: i32,
    pub regions_failed: i32,
    pub records_collected: i32,
    pub records_saved: i32,
}

impl CrawlRunCounts {
    /// Builds counts from in-memory sizes, saturating at `i32::MAX`.
    #[must_use]
    pub fn new(
        regions_total: usize,
        regions_failed: usize,
        records_collected: usize,
        records_saved: usize,
    ) -> Self {
        let clamp = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
        Self {
            regions_total: clamp(regions_total),
            regions_failed: clamp(regions_failed),
            records_collected: clamp(records_collected),
            records_saved: clamp(records_saved),
        }
    }
}

/// Creates a new crawl run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including when
/// `trigger_source` is not one of `cli`, `api` or `scheduler`.
pub async fn create_crawl_run(pool: &PgPool, trigger_source: &str) -> Result<CrawlRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, CrawlRunRow>(&format!(
        "INSERT INTO crawl_runs (public_id, trigger_source, status) \
         VALUES ($1, $2, 'queued') \
         RETURNING {CRAWL_RUN_COLUMNS}"
    ))
    .bind(public_id)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidCrawlRunTransition`] if the run is not `queued`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn start_crawl_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE crawl_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidCrawlRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded` and records its counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidCrawlRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_crawl_run(
    pool: &PgPool,
    id: i64,
    counts: CrawlRunCounts,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE crawl_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             regions_total = $1, regions_failed = $2, \
             records_collected = $3, records_saved = $4 \
         WHERE id = $5 AND status = 'running'",
    )
    .bind(counts.regions_total)
    .bind(counts.regions_failed)
    .bind(counts.records_collected)
    .bind(counts.records_saved)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidCrawlRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed`, keeping whatever counters were known.
///
/// # Errors
///
/// Returns [`DbError::InvalidCrawlRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_crawl_run(
    pool: &PgPool,
    id: i64,
    error_message: &str,
    counts: CrawlRunCounts,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE crawl_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1, \
             regions_total = $2, regions_failed = $3, \
             records_collected = $4, records_saved = $5 \
         WHERE id = $6 AND status = 'running'",
    )
    .bind(error_message)
    .bind(counts.regions_total)
    .bind(counts.regions_failed)
    .bind(counts.records_collected)
    .bind(counts.records_saved)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidCrawlRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_crawl_run(pool: &PgPool, id: i64) -> Result<CrawlRunRow, DbError> {
    let row = sqlx::query_as::<_, CrawlRunRow>(&format!(
        "SELECT {CRAWL_RUN_COLUMNS} FROM crawl_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Fetches a single run by its public UUID.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no run has `public_id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_crawl_run_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<CrawlRunRow, DbError> {
    let row = sqlx::query_as::<_, CrawlRunRow>(&format!(
        "SELECT {CRAWL_RUN_COLUMNS} FROM crawl_runs WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// The most recently created run, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_crawl_run(pool: &PgPool) -> Result<Option<CrawlRunRow>, DbError> {
    let row = sqlx::query_as::<_, CrawlRunRow>(&format!(
        "SELECT {CRAWL_RUN_COLUMNS} FROM crawl_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT 1"
    ))
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_crawl_runs(pool: &PgPool, limit: i64) -> Result<Vec<CrawlRunRow>, DbError> {
    let rows = sqlx::query_as::<_, CrawlRunRow>(&format!(
        "SELECT {CRAWL_RUN_COLUMNS} FROM crawl_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
