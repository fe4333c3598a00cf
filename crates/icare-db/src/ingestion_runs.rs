//! Database operations for `ingestion_runs`.
//!
//! A run moves `queued -> running -> succeeded | failed`; each transition
//! only applies from its expected predecessor.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `ingestion_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestionRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub run_type: String,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub records_processed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

const RUN_COLUMNS: &str = "id, public_id, run_type, trigger_source, status, \
                           started_at, completed_at, records_processed, error_message, created_at";

/// Creates a new run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including when `run_type`
/// or `trigger_source` violate the table's check constraints.
pub async fn create_ingestion_run(
    pool: &PgPool,
    run_type: &str,
    trigger_source: &str,
) -> Result<IngestionRunRow, DbError> {
    let row = sqlx::query_as::<_, IngestionRunRow>(&format!(
        "INSERT INTO ingestion_runs (public_id, run_type, trigger_source, status) \
         VALUES ($1, $2, $3, 'queued') \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(run_type)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a `queued` run as `running`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not queued, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn start_ingestion_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingestion_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a `running` run as `succeeded`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not running, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_ingestion_run(
    pool: &PgPool,
    id: i64,
    records_processed: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingestion_runs \
         SET status = 'succeeded', completed_at = NOW(), records_processed = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(records_processed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a `running` run as `failed` with the given message.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not running, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_ingestion_run(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingestion_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no run has the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_ingestion_run(pool: &PgPool, id: i64) -> Result<IngestionRunRow, DbError> {
    sqlx::query_as::<_, IngestionRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM ingestion_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_ingestion_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<IngestionRunRow>, DbError> {
    let rows = sqlx::query_as::<_, IngestionRunRow>(&format!(
        "SELECT {RUN_COLUMNS} \
         FROM ingestion_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
