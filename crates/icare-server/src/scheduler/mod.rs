//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the daily
//! pharmacy refresh and the chat-session eviction sweep.

mod pharmacies;

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::chat::SessionStore;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Builds and starts the background job scheduler.
///
/// The returned [`JobScheduler`] must be kept alive for the lifetime of the
/// process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<icare_core::AppConfig>,
    sessions: SessionStore,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    pharmacies::register_pharmacy_refresh_job(&scheduler, pool, config).await?;
    register_session_sweep_job(&scheduler, sessions).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Drops idle chat sessions every five minutes.
async fn register_session_sweep_job(
    scheduler: &JobScheduler,
    sessions: SessionStore,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_repeated_async(SESSION_SWEEP_INTERVAL, move |_uuid, _lock| {
        let sessions = sessions.clone();
        Box::pin(async move {
            let removed = sessions.evict_expired().await;
            if removed > 0 {
                tracing::info!(removed, "scheduler: expired chat sessions evicted");
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
