//! Hospital and pharmacy listing views.
//!
//! Each view prefetches the rows inside a bounding box around the reference
//! point and hands them to the shared search listing, which applies the
//! exact radius, resolves operating state and orders the result.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDateTime;
use icare_core::envelope::FacilityView;
use icare_core::search::{self, ListingFilter, SearchRequest};
use icare_core::{Facility, FacilityKind, FacilityLocation, SortOrder};
use icare_db::{BoundingBox, DbError};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::middleware::RequestId;

use super::users::validate_location;
use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

const MAX_RADIUS_KM: f64 = 50.0;

#[derive(Debug, Default, Deserialize)]
pub(super) struct FacilityQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub user_id: Option<i64>,
    pub radius: Option<f64>,
    pub limit: Option<i64>,
    pub target_time: Option<String>,
    pub sort_by: Option<String>,
    /// Department filter; hospitals only.
    pub hospital_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct FacilityListing {
    status: &'static str,
    kind: FacilityKind,
    evaluated_at: NaiveDateTime,
    radius_km: f64,
    count: usize,
    results: Vec<FacilityView>,
}

/// Per-route defaults.
struct ListingView {
    kind: FacilityKind,
    filter: ListingFilter,
    default_limit: Option<i64>,
}

const HOSPITAL_SEARCH: ListingView = ListingView {
    kind: FacilityKind::Hospital,
    filter: ListingFilter::All,
    default_limit: None,
};

const HOSPITAL_OPEN: ListingView = ListingView {
    kind: FacilityKind::Hospital,
    filter: ListingFilter::OpenOnly,
    default_limit: None,
};

const HOSPITAL_NEARBY: ListingView = ListingView {
    kind: FacilityKind::Hospital,
    filter: ListingFilter::All,
    default_limit: None,
};

const PHARMACY_OPEN: ListingView = ListingView {
    kind: FacilityKind::Pharmacy,
    filter: ListingFilter::OpenOnly,
    default_limit: None,
};

const PHARMACY_NEARBY: ListingView = ListingView {
    kind: FacilityKind::Pharmacy,
    filter: ListingFilter::All,
    default_limit: Some(5),
};

/// GET /api/v1/hospitals/search
pub(super) async fn search_hospitals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FacilityQuery>,
) -> Result<Json<ApiResponse<FacilityListing>>, ApiError> {
    list_view(&state, req_id, query, &HOSPITAL_SEARCH).await
}

/// GET /api/v1/hospitals/open
pub(super) async fn open_hospitals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FacilityQuery>,
) -> Result<Json<ApiResponse<FacilityListing>>, ApiError> {
    list_view(&state, req_id, query, &HOSPITAL_OPEN).await
}

/// GET /api/v1/hospitals/nearby
pub(super) async fn nearby_hospitals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FacilityQuery>,
) -> Result<Json<ApiResponse<FacilityListing>>, ApiError> {
    list_view(&state, req_id, query, &HOSPITAL_NEARBY).await
}

/// GET /api/v1/pharmacies/open
pub(super) async fn open_pharmacies(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FacilityQuery>,
) -> Result<Json<ApiResponse<FacilityListing>>, ApiError> {
    list_view(&state, req_id, query, &PHARMACY_OPEN).await
}

/// GET /api/v1/pharmacies/nearby
pub(super) async fn nearby_pharmacies(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FacilityQuery>,
) -> Result<Json<ApiResponse<FacilityListing>>, ApiError> {
    list_view(&state, req_id, query, &PHARMACY_NEARBY).await
}

async fn list_view(
    state: &AppState,
    req_id: RequestId,
    query: FacilityQuery,
    view: &ListingView,
) -> Result<Json<ApiResponse<FacilityListing>>, ApiError> {
    let rid = req_id.0;

    let sort_by = query
        .sort_by
        .as_deref()
        .map(str::parse::<SortOrder>)
        .transpose()
        .map_err(|reason| ApiError::new(rid.clone(), "validation_error", reason))?;
    if query
        .radius
        .is_some_and(|r| !r.is_finite() || r <= 0.0 || r > MAX_RADIUS_KM)
    {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("radius must be within (0, {MAX_RADIUS_KM}] km"),
        ));
    }

    let reference = resolve_reference(state, &rid, query.lat, query.lng, query.user_id).await?;
    let limit = usize::try_from(normalize_limit(query.limit.or(view.default_limit))).ok();

    let request = SearchRequest {
        latitude: Some(reference.latitude),
        longitude: Some(reference.longitude),
        radius_km: query.radius,
        query: match view.kind {
            FacilityKind::Hospital => query.hospital_type,
            FacilityKind::Pharmacy => None,
        },
        target_time: query.target_time,
        sort_by,
        limit,
    };
    let radius_km = request.radius_km(view.kind);

    let candidates = load_candidates(&state.pool, view.kind, reference, radius_km)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let response = search::list(view.kind, &request, candidates, state.now(), view.filter)
        .map_err(|_| ApiError::missing_location(rid.clone()))?;

    let results: Vec<FacilityView> = response
        .outcome
        .results()
        .iter()
        .map(FacilityView::from)
        .collect();

    tracing::debug!(
        kind = %view.kind,
        radius_km,
        count = results.len(),
        "facility listing served"
    );

    Ok(Json(ApiResponse::new(
        rid,
        FacilityListing {
            status: if results.is_empty() { "no_results" } else { "found" },
            kind: view.kind,
            evaluated_at: response.instant,
            radius_km,
            count: results.len(),
            results,
        },
    )))
}

/// Explicit coordinates win; otherwise the user's saved location is used.
pub(super) async fn resolve_reference(
    state: &AppState,
    request_id: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
    user_id: Option<i64>,
) -> Result<FacilityLocation, ApiError> {
    if let (Some(lat), Some(lng)) = (latitude, longitude) {
        return validate_location(request_id, lat, lng);
    }

    let Some(user_id) = user_id else {
        return Err(ApiError::missing_location(request_id));
    };

    icare_db::get_user_location(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(request_id.to_string(), &e))?
        .ok_or_else(|| ApiError::missing_location(request_id))
}

/// Facilities of `kind` inside the box that encloses `radius_km` around
/// `reference`.
pub(super) async fn load_candidates(
    pool: &PgPool,
    kind: FacilityKind,
    reference: FacilityLocation,
    radius_km: f64,
) -> Result<Vec<Facility>, DbError> {
    let bounds = BoundingBox::around(reference, radius_km);
    let facilities = match kind {
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
    Ok(facilities)
}
