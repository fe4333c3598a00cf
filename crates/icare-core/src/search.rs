//! Facility search: turns a caller's request into a resolved instant and a
//! ranked or listed set of facilities.

use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

use crate::facility::{Facility, FacilityKind, FacilityLocation};
use crate::hours::target_time;
use crate::proximity::{self, RankQuery, ResolvedFacility, SortOrder, DEFAULT_LIMIT};

/// Pharmacy tool searches only consider this many nearest candidates.
pub const PHARMACY_PREFETCH: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("reference location is required")]
    MissingLocation,
}

/// Result of a search that ran. An empty radius is not an error.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Found(Vec<ResolvedFacility>),
    NoResultsInRadius { radius_km: f64 },
}

impl SearchOutcome {
    fn from_results(results: Vec<ResolvedFacility>, radius_km: f64) -> Self {
        if results.is_empty() {
            SearchOutcome::NoResultsInRadius { radius_km }
        } else {
            SearchOutcome::Found(results)
        }
    }

    #[must_use]
    pub fn results(&self) -> &[ResolvedFacility] {
        match self {
            SearchOutcome::Found(results) => results,
            SearchOutcome::NoResultsInRadius { .. } => &[],
        }
    }

    #[must_use]
    pub fn into_results(self) -> Vec<ResolvedFacility> {
        match self {
            SearchOutcome::Found(results) => results,
            SearchOutcome::NoResultsInRadius { .. } => Vec::new(),
        }
    }
}

/// Which states a listing keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFilter {
    All,
    OpenOnly,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
    /// Department substring; only meaningful for hospitals.
    pub query: Option<String>,
    pub target_time: Option<String>,
    pub sort_by: Option<SortOrder>,
    pub limit: Option<usize>,
}

impl SearchRequest {
    /// # Errors
    ///
    /// Returns [`SearchError::MissingLocation`] unless both coordinates are set.
    pub fn reference(&self) -> Result<FacilityLocation, SearchError> {
        FacilityLocation::from_parts(self.latitude, self.longitude)
            .ok_or(SearchError::MissingLocation)
    }

    #[must_use]
    pub fn radius_km(&self, kind: FacilityKind) -> f64 {
        self.radius_km
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or_else(|| kind.default_radius_km())
    }

    fn target_phrase(&self) -> Option<&str> {
        self.target_time
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Instant the search evaluates: the parsed target phrase, else `now`.
    #[must_use]
    pub fn instant(&self, now: NaiveDateTime) -> NaiveDateTime {
        self.target_phrase()
            .map_or(now, |phrase| target_time::parse(phrase, now))
    }

    fn category(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }
}

/// A finished search together with the instant it was evaluated at.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub kind: FacilityKind,
    pub instant: NaiveDateTime,
    pub explicit_time: bool,
    pub sort_by: Option<SortOrder>,
    pub radius_km: f64,
    pub outcome: SearchOutcome,
}

/// Ranked search with the "usable now" default view.
///
/// # Errors
///
/// Returns [`SearchError::MissingLocation`] when the request has no
/// reference coordinates.
pub fn search(
    kind: FacilityKind,
    request: &SearchRequest,
    candidates: Vec<Facility>,
    now: NaiveDateTime,
) -> Result<SearchResponse, SearchError> {
    let reference = request.reference()?;
    let radius_km = request.radius_km(kind);
    let instant = request.instant(now);

    let mut candidates = filter_category(candidates, request.category().as_deref());
    if kind == FacilityKind::Pharmacy {
        candidates = nearest(reference, candidates, radius_km, PHARMACY_PREFETCH);
    }

    let query = RankQuery::new(radius_km, instant)
        .with_order(request.sort_by)
        .with_limit(request.limit.unwrap_or(DEFAULT_LIMIT));
    let ranked = proximity::rank(reference, candidates, &query);

    tracing::debug!(
        kind = %kind,
        radius_km,
        %instant,
        count = ranked.len(),
        "facility search ranked"
    );

    Ok(SearchResponse {
        kind,
        instant,
        explicit_time: request.target_phrase().is_some(),
        sort_by: request.sort_by,
        radius_km,
        outcome: SearchOutcome::from_results(ranked, radius_km),
    })
}

/// Listing used by the HTTP views: every facility in range tagged with its
/// state, nearest first unless a sort order is given.
///
/// # Errors
///
/// Returns [`SearchError::MissingLocation`] when the request has no
/// reference coordinates.
pub fn list(
    kind: FacilityKind,
    request: &SearchRequest,
    candidates: Vec<Facility>,
    now: NaiveDateTime,
    filter: ListingFilter,
) -> Result<SearchResponse, SearchError> {
    let reference = request.reference()?;
    let radius_km = request.radius_km(kind);
    let instant = request.instant(now);
    let candidates = filter_category(candidates, request.category().as_deref());

    let mut listed = match request.sort_by {
        Some(order) => {
            let query = RankQuery::new(radius_km, instant)
                .with_order(Some(order))
                .with_limit(usize::MAX);
            proximity::rank(reference, candidates, &query)
        }
        None => proximity::nearby(reference, candidates, radius_km, instant),
    };

    if filter == ListingFilter::OpenOnly {
        listed.retain(|r| r.state == crate::hours::OperatingState::Open);
    }
    if let Some(limit) = request.limit {
        listed.truncate(limit);
    }

    Ok(SearchResponse {
        kind,
        instant,
        explicit_time: request.target_phrase().is_some(),
        sort_by: request.sort_by,
        radius_km,
        outcome: SearchOutcome::from_results(listed, radius_km),
    })
}

fn filter_category(candidates: Vec<Facility>, category: Option<&str>) -> Vec<Facility> {
    let Some(category) = category else {
        return candidates;
    };
    candidates
        .into_iter()
        .filter(|f| {
            f.category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(category))
        })
        .collect()
}

fn nearest(
    reference: FacilityLocation,
    candidates: Vec<Facility>,
    radius_km: f64,
    take: usize,
) -> Vec<Facility> {
    let mut with_distance: Vec<(f64, Facility)> = candidates
        .into_iter()
        .map(|f| (proximity::distance_km(reference, f.location), f))
        .filter(|(d, _)| *d <= radius_km)
        .collect();
    with_distance.sort_by(|a, b| a.0.total_cmp(&b.0));
    with_distance.into_iter().take(take).map(|(_, f)| f).collect()
}
