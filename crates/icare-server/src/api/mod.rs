mod chat;
mod drugs;
mod facilities;
mod ingestion_runs;
mod prescriptions;
mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use icare_core::AppConfig;
use icare_publicdata::PublicDataClient;
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer,
};

use crate::chat::SessionStore;
use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub sessions: SessionStore,
    /// Absent when no `DRUG_API_KEY` is configured.
    pub drugs: Option<PublicDataClient>,
}

impl AppState {
    /// # Errors
    ///
    /// Returns an error if the drug-info HTTP client cannot be built.
    pub fn new(pool: PgPool, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let drugs = match config.drug_api_key.as_deref() {
            Some(key) => Some(
                PublicDataClient::new(key, config.publicdata_timeout_secs)?.with_retry(
                    config.publicdata_max_retries,
                    config.publicdata_retry_backoff_base_ms,
                ),
            ),
            None => {
                tracing::warn!("DRUG_API_KEY not set; drug search will answer with an error");
                None
            }
        };

        Ok(Self {
            pool,
            sessions: SessionStore::from_config(&config),
            config,
            drugs,
        })
    }

    /// Local wall-clock instant the hours engine evaluates against.
    fn now(&self) -> NaiveDateTime {
        self.config.local_now()
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: String, data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub(super) fn missing_location(request_id: impl Into<String>) -> Self {
        Self::new(
            request_id,
            "missing_location",
            "lat and lng, or a user_id with a saved location, are required",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" | "missing_location" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &icare_db::DbError) -> ApiError {
    match error {
        icare_db::DbError::NotFound => ApiError::new(request_id, "not_found", "resource not found"),
        icare_db::DbError::Sqlx(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            ApiError::new(request_id, "conflict", "resource already exists")
        }
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/users", post(users::create_user))
        .route("/api/v1/users/{id}", get(users::get_user))
        .route(
            "/api/v1/users/{id}/location",
            put(users::update_location).get(users::get_location),
        )
        .route(
            "/api/v1/users/{id}/children",
            post(users::create_child).get(users::list_children),
        )
        .route(
            "/api/v1/children/{id}/prescriptions",
            post(prescriptions::create_prescription).get(prescriptions::list_prescriptions),
        )
        .route(
            "/api/v1/prescriptions/{id}",
            get(prescriptions::get_prescription).delete(prescriptions::delete_prescription),
        )
        .route("/api/v1/hospitals/search", get(facilities::search_hospitals))
        .route("/api/v1/hospitals/open", get(facilities::open_hospitals))
        .route("/api/v1/hospitals/nearby", get(facilities::nearby_hospitals))
        .route("/api/v1/pharmacies/open", get(facilities::open_pharmacies))
        .route(
            "/api/v1/pharmacies/nearby",
            get(facilities::nearby_pharmacies),
        )
        .route("/api/v1/drugs/search", post(drugs::search_drugs))
        .route(
            "/api/v1/chat/tools/search_hospital",
            post(chat::search_hospital_tool),
        )
        .route(
            "/api/v1/chat/tools/search_pharmacy",
            post(chat::search_pharmacy_tool),
        )
        .route("/api/v1/chat/welcome", get(chat::welcome))
        .route("/api/v1/chat", post(chat::chat))
        .route("/api/v1/chat/sessions/{id}", get(chat::session_history))
        .route(
            "/api/v1/ingestion-runs",
            get(ingestion_runs::list_ingestion_runs),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::new())
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match icare_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::new(
                req_id.0,
                HealthData {
                    status: "ok",
                    database: "ok",
                },
            )),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::new(
                    req_id.0,
                    HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                )),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
