//! Durable work queue backing the ingestion workers.
//!
//! Jobs move `queued` -> `running` -> `done`. Claiming uses
//! `FOR UPDATE SKIP LOCKED` so any number of worker tasks, across any number of
//! processes, can poll the same table. A job stuck in `running` past the
//! visibility timeout (its worker died) is claimable again, which gives
//! at-least-once delivery. Jobs are not deduplicated by URL.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `ingest_jobs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestJobRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub status: String,
    /// Number of times the job has been claimed.
    pub attempts: i32,
    /// Pipeline outcome label, set when the job reaches `done`.
    pub outcome: Option<String>,
    pub error_message: Option<String>,
    pub locked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Number of jobs sharing a status and outcome.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct JobStatusCount {
    pub status: String,
    pub outcome: Option<String>,
    pub count: i64,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Appends a job in `queued` status and returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn enqueue_ingest_job(pool: &PgPool, title: &str, url: &str) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO ingest_jobs (title, url, status) \
         VALUES ($1, $2, 'queued') \
         RETURNING id",
    )
    .bind(title)
    .bind(url)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Claims the oldest available job, marking it `running`.
///
/// Available means `queued`, or `running` with a lock older than
/// `visibility_timeout_secs`. Returns `None` when nothing is available.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn claim_next_job(
    pool: &PgPool,
    visibility_timeout_secs: i64,
) -> Result<Option<IngestJobRow>, DbError> {
    let row = sqlx::query_as::<_, IngestJobRow>(
        "UPDATE ingest_jobs \
         SET status = 'running', locked_at = NOW(), attempts = attempts + 1 \
         WHERE id = ( \
             SELECT id FROM ingest_jobs \
             WHERE status = 'queued' \
                OR (status = 'running' \
                    AND locked_at < NOW() - ($1::bigint * INTERVAL '1 second')) \
             ORDER BY id \
             FOR UPDATE SKIP LOCKED \
             LIMIT 1 \
         ) \
         RETURNING id, title, url, status, attempts, outcome, error_message, \
                   locked_at, created_at, completed_at",
    )
    .bind(visibility_timeout_secs)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Marks a running job `done` with its outcome label.
///
/// # Errors
///
/// Returns [`DbError::InvalidJobTransition`] if the job is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_job(
    pool: &PgPool,
    id: i64,
    outcome: &str,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingest_jobs \
         SET status = 'done', outcome = $1, error_message = $2, completed_at = NOW() \
         WHERE id = $3 AND status = 'running'",
    )
    .bind(outcome)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidJobTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single job by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_ingest_job(pool: &PgPool, id: i64) -> Result<IngestJobRow, DbError> {
    let row = sqlx::query_as::<_, IngestJobRow>(
        "SELECT id, title, url, status, attempts, outcome, error_message, \
                locked_at, created_at, completed_at \
         FROM ingest_jobs \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Counts jobs grouped by status and outcome.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_jobs_by_status(pool: &PgPool) -> Result<Vec<JobStatusCount>, DbError> {
    let rows = sqlx::query_as::<_, JobStatusCount>(
        "SELECT status, outcome, COUNT(*) AS count \
         FROM ingest_jobs \
         GROUP BY status, outcome \
         ORDER BY status, outcome NULLS FIRST",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
