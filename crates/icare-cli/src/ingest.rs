//! One-shot ingestion commands.
//!
//! Each command is tracked as an `ingestion_runs` row with trigger source
//! `cli`. Fetch failures for a single hospital are logged and skipped; page
//! fetch failures and DB write failures abort the run and mark it failed.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use icare_core::{AppConfig, NewHospital};
use icare_publicdata::{HospitalBasisItem, PublicDataClient};

const HOSPITAL_ROWS_PER_PAGE: u32 = 100;

/// HIRA `sidoCd` for a supported region name.
pub(crate) fn region_code(region: &str) -> Option<&'static str> {
    match region.trim() {
        "서울" | "seoul" => Some("110000"),
        "경기" | "gyeonggi" => Some("310000"),
        _ => None,
    }
}

fn build_client(
    key: Option<&str>,
    var: &str,
    config: &AppConfig,
) -> anyhow::Result<PublicDataClient> {
    let key = key.ok_or_else(|| anyhow::anyhow!("{var} is not set; cannot run ingestion"))?;
    let client = PublicDataClient::new(key, config.publicdata_timeout_secs)
        .map_err(|e| anyhow::anyhow!("failed to build public-data client: {e}"))?;
    Ok(client.with_retry(
        config.publicdata_max_retries,
        config.publicdata_retry_backoff_base_ms,
    ))
}

/// Creates and starts a CLI-triggered run.
async fn begin_run(pool: &sqlx::PgPool, run_type: &'static str) -> anyhow::Result<i64> {
    let run = icare_db::create_ingestion_run(pool, run_type, "cli").await?;
    if let Err(e) = icare_db::start_ingestion_run(pool, run.id).await {
        crate::fail_run_best_effort(pool, run.id, run_type, format!("{e:#}")).await;
        return Err(e.into());
    }
    Ok(run.id)
}

/// Closes a run from the outcome of its work.
async fn finish_run(
    pool: &sqlx::PgPool,
    run_id: i64,
    run_type: &'static str,
    result: anyhow::Result<usize>,
) -> anyhow::Result<usize> {
    match result {
        Ok(count) => {
            let records = i32::try_from(count).unwrap_or(i32::MAX);
            if let Err(err) = icare_db::complete_ingestion_run(pool, run_id, records).await {
                crate::fail_run_best_effort(pool, run_id, run_type, format!("{err:#}")).await;
                return Err(err.into());
            }
            Ok(count)
        }
        Err(err) => {
            crate::fail_run_best_effort(pool, run_id, run_type, format!("{err:#}")).await;
            Err(err)
        }
    }
}

/// Downloads every pharmacy, upserts by `hpid` and deactivates rows missing
/// from the download. An empty download leaves the table untouched.
///
/// # Errors
///
/// Returns an error if `PHARMACY_API_KEY` is missing, the run cannot be
/// tracked, the download fails, or the upsert fails.
pub(crate) async fn run_ingest_pharmacies(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    rows: u32,
) -> anyhow::Result<()> {
    let client = build_client(config.pharmacy_api_key.as_deref(), "PHARMACY_API_KEY", config)?;
    let run_id = begin_run(pool, "pharmacies").await?;

    let result: anyhow::Result<usize> = async {
        let items = client.fetch_all_pharmacies(rows.max(1)).await?;
        let pharmacies = icare_publicdata::normalize_pharmacies(&items);
        if pharmacies.is_empty() {
            tracing::warn!(fetched = items.len(), "no usable pharmacies; skipping upsert");
            return Ok(0);
        }

        let (inserted, updated) = icare_db::upsert_pharmacies(pool, &pharmacies).await?;
        let seen: Vec<String> = pharmacies.iter().map(|p| p.hpid.clone()).collect();
        let deactivated = icare_db::deactivate_missing_pharmacies(pool, &seen).await?;
        println!("pharmacies: {inserted} inserted, {updated} updated, {deactivated} deactivated");
        Ok(pharmacies.len())
    }
    .await;

    let count = finish_run(pool, run_id, "pharmacies", result).await?;
    println!("ingested {count} pharmacies");
    Ok(())
}

/// Pages through a region's hospital list, enriches each hospital with its
/// detail and department records, and upserts by `ykiho`.
///
/// # Errors
///
/// Returns an error if the region is unknown, `HOSPITAL_API_KEY` is
/// missing, the run cannot be tracked, a list page fails, or the upsert
/// fails.
pub(crate) async fn run_ingest_hospitals(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    region: &str,
    workers: usize,
) -> anyhow::Result<()> {
    let sido_code = region_code(region)
        .ok_or_else(|| anyhow::anyhow!("unknown region '{region}' (expected 서울 or 경기)"))?;
    let client = build_client(config.hospital_api_key.as_deref(), "HOSPITAL_API_KEY", config)?;
    let run_id = begin_run(pool, "hospitals").await?;

    let result: anyhow::Result<usize> = async {
        let basis = fetch_region_basis(&client, sido_code).await?;
        tracing::info!(region, count = basis.len(), "hospital basis list fetched");

        let hospitals = enrich_hospitals(&client, &basis, workers.max(1)).await;
        let (inserted, updated) = icare_db::upsert_hospitals(pool, &hospitals).await?;
        let total = icare_db::count_hospitals(pool).await?;
        println!("hospitals: {inserted} inserted, {updated} updated, {total} stored");
        Ok(hospitals.len())
    }
    .await;

    let count = finish_run(pool, run_id, "hospitals", result).await?;
    println!("ingested {count} hospitals for {region}");
    Ok(())
}

/// Basis pages until an empty page, dropping repeated `ykiho`s.
async fn fetch_region_basis(
    client: &PublicDataClient,
    sido_code: &str,
) -> anyhow::Result<Vec<HospitalBasisItem>> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        let batch = client
            .fetch_hospital_basis_page(sido_code, page, HOSPITAL_ROWS_PER_PAGE)
            .await?;
        if batch.items.is_empty() {
            break;
        }
        tracing::debug!(page, count = batch.items.len(), "hospital basis page");

        for item in batch.items {
            let Some(ykiho) = item.ykiho.clone().filter(|y| !y.trim().is_empty()) else {
                continue;
            };
            if seen.insert(ykiho) {
                items.push(item);
            }
        }
        page += 1;
    }

    Ok(items)
}

async fn enrich_hospitals(
    client: &PublicDataClient,
    basis: &[HospitalBasisItem],
    workers: usize,
) -> Vec<NewHospital> {
    stream::iter(basis)
        .map(|item| enrich_one(client, item))
        .buffer_unordered(workers)
        .filter_map(|hospital| async move { hospital })
        .collect()
        .await
}

/// Missing detail or department data degrades to an empty schedule or the
/// general-clinic type rather than dropping the hospital.
async fn enrich_one(client: &PublicDataClient, item: &HospitalBasisItem) -> Option<NewHospital> {
    let ykiho = item.ykiho.as_deref()?;

    let (detail, departments) = futures::join!(
        client.fetch_hospital_detail(ykiho),
        client.fetch_hospital_departments(ykiho)
    );
    let detail = detail.unwrap_or_else(|e| {
        tracing::warn!(ykiho, error = %e, "hospital detail unavailable");
        None
    });
    let departments = departments.unwrap_or_else(|e| {
        tracing::warn!(ykiho, error = %e, "hospital departments unavailable");
        Vec::new()
    });

    icare_publicdata::normalize_hospital(item, detail.as_ref(), &departments)
}
