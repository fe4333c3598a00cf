//! Users, their saved location and their children.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use icare_core::FacilityLocation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CreateUserRequest {
    pub email: String,
    #[serde(default)]
    pub term_agreed: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct LocationRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateChildRequest {
    pub child_name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct UserItem {
    id: i64,
    public_id: Uuid,
    email: String,
    term_agreed: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
    location_updated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<icare_db::UserRow> for UserItem {
    fn from(row: icare_db::UserRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            email: row.email,
            term_agreed: row.term_agreed,
            latitude: row.latitude,
            longitude: row.longitude,
            location_updated_at: row.location_updated_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct LocationItem {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct ChildItem {
    id: i64,
    user_id: i64,
    child_name: String,
    created_at: DateTime<Utc>,
}

impl From<icare_db::ChildRow> for ChildItem {
    fn from(row: icare_db::ChildRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            child_name: row.child_name,
            created_at: row.created_at,
        }
    }
}

/// POST /api/v1/users
pub(super) async fn create_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserItem>>), ApiError> {
    let email = body.email.trim();
    if email.is_empty() || !email.contains('@') || email.len() > 320 {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "email must be a valid address",
        ));
    }

    let row = icare_db::create_user(&state.pool, email, body.term_agreed)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(req_id.0, row.into())),
    ))
}

/// GET /api/v1/users/{id}
pub(super) async fn get_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserItem>>, ApiError> {
    let row = icare_db::get_user(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, row.into())))
}

/// PUT /api/v1/users/{id}/location
pub(super) async fn update_location(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<LocationRequest>,
) -> Result<Json<ApiResponse<UserItem>>, ApiError> {
    let location = validate_location(&req_id.0, body.latitude, body.longitude)?;

    let row = icare_db::update_user_location(&state.pool, id, location)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::debug!(user_id = id, "user location updated");
    Ok(Json(ApiResponse::new(req_id.0, row.into())))
}

/// GET /api/v1/users/{id}/location
pub(super) async fn get_location(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LocationItem>>, ApiError> {
    let location = icare_db::get_user_location(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "no saved location"))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        LocationItem {
            latitude: location.latitude,
            longitude: location.longitude,
        },
    )))
}

/// POST /api/v1/users/{id}/children
pub(super) async fn create_child(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
    Json(body): Json<CreateChildRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ChildItem>>), ApiError> {
    let name = body.child_name.trim();
    if name.is_empty() || name.chars().count() > 100 {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "child_name must be 1-100 characters",
        ));
    }

    let row = icare_db::create_child(&state.pool, user_id, name)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(req_id.0, row.into())),
    ))
}

/// GET /api/v1/users/{id}/children
pub(super) async fn list_children(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ChildItem>>>, ApiError> {
    let rows = icare_db::list_children_for_user(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        rows.into_iter().map(ChildItem::from).collect(),
    )))
}

pub(super) fn validate_location(
    request_id: &str,
    latitude: f64,
    longitude: f64,
) -> Result<FacilityLocation, ApiError> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "latitude must be within [-90, 90] and longitude within [-180, 180]",
        ));
    }
    Ok(FacilityLocation::new(latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_location_rejects_out_of_range() {
        assert!(validate_location("r", 91.0, 0.0).is_err());
        assert!(validate_location("r", 0.0, -181.0).is_err());
        assert!(validate_location("r", f64::NAN, 0.0).is_err());
        let ok = validate_location("r", 37.5, 127.0).expect("valid");
        assert!((ok.latitude - 37.5).abs() < f64::EPSILON);
    }
}
