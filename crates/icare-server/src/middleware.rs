use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// API key auth settings used by middleware.
#[derive(Clone)]
pub struct AuthState {
    api_keys: Arc<Vec<String>>,
    pub enabled: bool,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("api_keys", &format_args!("[{} redacted]", self.api_keys.len()))
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl AuthState {
    /// Builds auth config from `ICARE_API_KEYS` (comma-separated bearer tokens).
    ///
    /// # Errors
    ///
    /// Fails outside development when no key is configured.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("ICARE_API_KEYS").unwrap_or_default();
        Self::from_keys(&raw, is_development)
    }

    /// In development, an empty key list disables auth for local iteration.
    /// Elsewhere it fails startup.
    ///
    /// # Errors
    ///
    /// Fails outside development when `raw` holds no key.
    pub fn from_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let mut keys: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        keys.dedup();

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "ICARE_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    api_keys: Arc::new(Vec::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "ICARE_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self {
            api_keys: Arc::new(keys),
            enabled: true,
        })
    }

    /// Compares against every key so the match position does not leak.
    fn allows(&self, token: &str) -> bool {
        self.api_keys
            .iter()
            .fold(subtle::Choice::from(0), |found, key| {
                found | key.as_bytes().ct_eq(token.as_bytes())
            })
            .into()
    }
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter shared by every protected route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

fn reject(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            error: MiddlewareError { code, message },
        }),
    )
        .into_response()
}

/// Axum middleware that extracts or generates a request ID.
///
/// An incoming `x-request-id` header is reused, otherwise a `UUIDv4` is
/// generated. The ID lands in request extensions as [`RequestId`] and is
/// echoed on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing Bearer token auth when enabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        ),
    }
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;

    if window.started_at.elapsed() >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return reject(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded",
        );
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_state_disables_when_no_keys_in_dev() {
        let state = AuthState::from_keys("", true).expect("dev should allow missing keys");
        assert!(!state.enabled);
    }

    #[test]
    fn auth_state_requires_keys_outside_dev() {
        assert!(AuthState::from_keys(" , ", false).is_err());
    }

    #[test]
    fn auth_state_matches_any_configured_key() {
        let state = AuthState::from_keys("alpha, beta", false).expect("keys");
        assert!(state.enabled);
        assert!(state.allows("beta"));
        assert!(!state.allows("gamma"));
        assert!(!state.allows("alph"));
    }

    #[test]
    fn auth_state_debug_hides_keys() {
        let state = AuthState::from_keys("secret-token", false).expect("keys");
        assert!(!format!("{state:?}").contains("secret-token"));
    }
}
