use icare_core::AppConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/icare-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("ingestion run {id} is not in '{expected_status}' status")]
    InvalidRunTransition {
        id: i64,
        expected_status: &'static str,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations and return how many were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // _sqlx_migrations does not exist on a fresh database.
    let applied_before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let applied_after = applied_migrations(pool).await;

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

async fn applied_migrations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}


pub mod bounds;
pub mod children;
pub mod hospitals;
pub mod ingestion_runs;
pub mod pharmacies;
pub mod prescriptions;
pub mod users;

pub use bounds::BoundingBox;
pub use children::{create_child, get_child, list_children_for_user, ChildRow};
pub use hospitals::{count_hospitals, list_hospitals_in_bounds, upsert_hospitals, HospitalRow};
pub use ingestion_runs::{
    complete_ingestion_run, create_ingestion_run, fail_ingestion_run, get_ingestion_run,
    list_ingestion_runs, start_ingestion_run, IngestionRunRow,
};
pub use pharmacies::{
    deactivate_missing_pharmacies, list_pharmacies_in_bounds, upsert_pharmacies, PharmacyRow,
};
pub use prescriptions::{
    create_prescription, delete_prescription, get_prescription, list_prescriptions_for_child,
    MedicineRow, NewMedicine, NewPrescription, PrescriptionDetail, PrescriptionRow,
};
pub use users::{create_user, get_user, get_user_location, update_user_location, UserRow};
