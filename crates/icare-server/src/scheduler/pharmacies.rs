//! Daily refresh of the pharmacy table from the NEMC full download.

use std::sync::Arc;

use icare_publicdata::PublicDataClient;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// 18:00 UTC is 03:00 in Asia/Seoul.
const DEFAULT_REFRESH_CRON: &str = "0 0 18 * * *";
const ROWS_PER_PAGE: u32 = 1000;

/// Registers the refresh at `ICARE_PHARMACY_REFRESH_CRON` (UTC). Skipped
/// with a warning when no `PHARMACY_API_KEY` is configured.
pub(super) async fn register_pharmacy_refresh_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<icare_core::AppConfig>,
) -> Result<(), JobSchedulerError> {
    let Some(key) = config.pharmacy_api_key.as_deref() else {
        tracing::warn!("scheduler: PHARMACY_API_KEY not set; pharmacy refresh disabled");
        return Ok(());
    };

    let client = match PublicDataClient::new(key, config.publicdata_timeout_secs) {
        Ok(client) => client.with_retry(
            config.publicdata_max_retries,
            config.publicdata_retry_backoff_base_ms,
        ),
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to build pharmacy client");
            return Ok(());
        }
    };

    let cron = std::env::var("ICARE_PHARMACY_REFRESH_CRON")
        .ok()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REFRESH_CRON.to_string());

    let pool = Arc::new(pool);
    let client = Arc::new(client);

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let client = Arc::clone(&client);

        Box::pin(async move {
            tracing::info!("scheduler: starting pharmacy refresh");
            run_tracked_refresh(&pool, &client).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: pharmacy refresh registered");
    Ok(())
}

/// Wraps one refresh in an `ingestion_runs` row.
async fn run_tracked_refresh(pool: &PgPool, client: &PublicDataClient) {
    let run = match icare_db::create_ingestion_run(pool, "pharmacies", "scheduler").await {
        Ok(run) => run,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to create ingestion run");
            return;
        }
    };
    if let Err(e) = icare_db::start_ingestion_run(pool, run.id).await {
        tracing::error!(run_id = run.id, error = %e, "scheduler: failed to start ingestion run");
        return;
    }

    match refresh_pharmacies(pool, client).await {
        Ok(count) => {
            let records = i32::try_from(count).unwrap_or(i32::MAX);
            if let Err(e) = icare_db::complete_ingestion_run(pool, run.id, records).await {
                tracing::error!(run_id = run.id, error = %e, "scheduler: failed to complete run");
            }
            tracing::info!(run_id = run.id, records, "scheduler: pharmacy refresh complete");
        }
        Err(e) => {
            tracing::error!(run_id = run.id, error = %e, "scheduler: pharmacy refresh failed");
            if let Err(mark_err) =
                icare_db::fail_ingestion_run(pool, run.id, &format!("{e:#}")).await
            {
                tracing::error!(
                    run_id = run.id,
                    error = %mark_err,
                    "scheduler: failed to mark pharmacy run as failed"
                );
            }
        }
    }
}

/// Fetches every page, upserts by `hpid` and deactivates rows missing from
/// this download. Returns the number of pharmacies written.
async fn refresh_pharmacies(pool: &PgPool, client: &PublicDataClient) -> anyhow::Result<usize> {
    let items = client.fetch_all_pharmacies(ROWS_PER_PAGE).await?;
    let pharmacies = icare_publicdata::normalize_pharmacies(&items);

    // An empty download is a feed failure, not a mass closure.
    if pharmacies.is_empty() {
        tracing::warn!(
            fetched = items.len(),
            "scheduler: no usable pharmacies fetched; skipping upsert and deactivation"
        );
        return Ok(0);
    }

    let (inserted, updated) = icare_db::upsert_pharmacies(pool, &pharmacies).await?;
    let seen: Vec<String> = pharmacies.iter().map(|p| p.hpid.clone()).collect();
    let deactivated = icare_db::deactivate_missing_pharmacies(pool, &seen).await?;

    tracing::info!(
        inserted,
        updated,
        deactivated,
        "scheduler: pharmacies upserted"
    );
    Ok(pharmacies.len())
}
