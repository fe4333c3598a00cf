//! Offline "which facilities are open" query against the local database.

use icare_core::search::{self, ListingFilter, SearchRequest};
use icare_core::{AppConfig, FacilityKind, FacilityLocation, ResolvedFacility, SortOrder};

#[derive(Debug)]
pub(crate) struct OpenArgs {
    pub kind: FacilityKind,
    pub latitude: f64,
    pub longitude: f64,
    pub at: Option<String>,
    pub sort: Option<SortOrder>,
    pub radius_km: Option<f64>,
    pub limit: usize,
}

pub(crate) fn parse_kind(raw: &str) -> anyhow::Result<FacilityKind> {
    match raw.trim().to_lowercase().as_str() {
        "pharmacy" | "pharmacies" | "약국" => Ok(FacilityKind::Pharmacy),
        "hospital" | "hospitals" | "병원" => Ok(FacilityKind::Hospital),
        other => anyhow::bail!("unknown facility kind '{other}' (expected pharmacy or hospital)"),
    }
}

/// Prints every facility in range ranked by `args.sort` (nearest first by
/// default) with its state at the requested instant.
///
/// # Errors
///
/// Returns an error if the coordinates are unusable or the candidate query
/// fails.
pub(crate) async fn run_open(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    args: &OpenArgs,
) -> anyhow::Result<()> {
    let Some(reference) = FacilityLocation::from_parts(Some(args.latitude), Some(args.longitude))
    else {
        anyhow::bail!("latitude and longitude must be non-zero coordinates");
    };

    let request = SearchRequest {
        latitude: Some(reference.latitude),
        longitude: Some(reference.longitude),
        radius_km: args.radius_km,
        query: None,
        target_time: args.at.clone(),
        sort_by: args.sort,
        limit: Some(args.limit.max(1)),
    };
    let radius_km = request.radius_km(args.kind);

    let bounds = icare_db::BoundingBox::around(reference, radius_km);
    let candidates = match args.kind {
        FacilityKind::Hospital => icare_db::list_hospitals_in_bounds(pool, bounds)
            .await?
            .iter()
            .map(icare_db::HospitalRow::to_facility)
            .collect(),
        FacilityKind::Pharmacy => icare_db::list_pharmacies_in_bounds(pool, bounds)
            .await?
            .iter()
            .map(icare_db::PharmacyRow::to_facility)
            .collect(),
    };

    let response = search::list(
        args.kind,
        &request,
        candidates,
        config.local_now(),
        ListingFilter::All,
    )?;

    println!(
        "{} within {radius_km} km at {}",
        args.kind.noun(),
        response.instant.format("%Y-%m-%d %H:%M")
    );
    let results = response.outcome.results();
    if results.is_empty() {
        println!("(none)");
    }
    for resolved in results {
        println!("{}", format_line(resolved));
    }
    Ok(())
}

fn format_line(resolved: &ResolvedFacility) -> String {
    let hours = |t: Option<chrono::NaiveTime>| {
        t.map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string())
    };
    format!(
        "{:>5.1} km  {:<6}  {}-{}  {}",
        resolved.rounded_distance_km(),
        resolved.state.label(),
        hours(resolved.opening_time),
        hours(resolved.closing_time),
        resolved.facility.name
    )
}
