//! The conversational endpoint and the search-tool boundary it shares with
//! an external agent.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use icare_core::envelope::{run_tool, ToolEnvelope, ToolRequest};
use icare_core::{FacilityKind, FacilityLocation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::{dispatch, ChatMessage, Intent, Role};
use crate::middleware::RequestId;

use super::facilities::load_candidates;
use super::{ApiError, ApiResponse, AppState};

const MAX_MESSAGE_CHARS: usize = 1000;

/// Tool arguments plus an optional user whose saved location stands in for
/// missing coordinates.
#[derive(Debug, Deserialize)]
pub(super) struct ToolCall {
    #[serde(flatten)]
    pub request: ToolRequest,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(super) enum ChatResponse {
    Single(ToolEnvelope),
    Multi {
        #[serde(rename = "type")]
        kind: &'static str,
        responses: Vec<ToolEnvelope>,
    },
}

#[derive(Debug, Serialize)]
pub(super) struct SessionHistory {
    session_id: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatReply {
    session_id: String,
    response: ChatResponse,
}

/// POST /api/v1/chat/tools/search_hospital
pub(super) async fn search_hospital_tool(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(call): Json<ToolCall>,
) -> Json<ApiResponse<ToolEnvelope>> {
    let envelope = run_search_tool(&state, FacilityKind::Hospital, call.request, call.user_id).await;
    Json(ApiResponse::new(req_id.0, envelope))
}

/// POST /api/v1/chat/tools/search_pharmacy
pub(super) async fn search_pharmacy_tool(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(call): Json<ToolCall>,
) -> Json<ApiResponse<ToolEnvelope>> {
    let envelope = run_search_tool(&state, FacilityKind::Pharmacy, call.request, call.user_id).await;
    Json(ApiResponse::new(req_id.0, envelope))
}

/// GET /api/v1/chat/welcome
pub(super) async fn welcome(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ToolEnvelope>> {
    Json(ApiResponse::new(req_id.0, ToolEnvelope::welcome()))
}

/// POST /api/v1/chat
pub(super) async fn chat(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, ApiError> {
    let message = body.message.trim();
    if message.is_empty() || message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("message must be 1-{MAX_MESSAGE_CHARS} characters"),
        ));
    }

    let session_id = body
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

    state
        .sessions
        .append(&session_id, ChatMessage::new(Role::User, message))
        .await;

    let routed = dispatch(message);
    let result = match routed.intent {
        Intent::Search { kind, mut request } => {
            request.latitude = body.latitude;
            request.longitude = body.longitude;
            run_search_tool(&state, kind, request, body.user_id).await
        }
        Intent::OffTopic => ToolEnvelope::off_topic(),
    };

    tracing::debug!(
        session_id = %session_id,
        reply = ?result.kind,
        count = result.data.len(),
        "chat message answered"
    );

    state
        .sessions
        .append(
            &session_id,
            ChatMessage::new(Role::Assistant, result.start_message.clone()),
        )
        .await;

    let response = match routed.acknowledgement {
        Some(ack) => ChatResponse::Multi {
            kind: "multi",
            responses: vec![ToolEnvelope::chat(ack, ""), result],
        },
        None => ChatResponse::Single(result),
    };

    Ok(Json(ApiResponse::new(
        req_id.0,
        ChatReply {
            session_id,
            response,
        },
    )))
}

/// GET /api/v1/chat/sessions/{id}
pub(super) async fn session_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionHistory>>, ApiError> {
    let messages = state.sessions.history(&session_id).await;
    if messages.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("chat session {session_id} not found"),
        ));
    }
    Ok(Json(ApiResponse::new(
        req_id.0,
        SessionHistory {
            session_id,
            messages,
        },
    )))
}

/// Fills missing coordinates from the user's saved location, loads nearby
/// candidates and runs the tool. Store failures become the generic error
/// envelope rather than an HTTP error.
async fn run_search_tool(
    state: &AppState,
    kind: FacilityKind,
    mut request: ToolRequest,
    user_id: Option<i64>,
) -> ToolEnvelope {
    let mut reference = FacilityLocation::from_parts(request.latitude, request.longitude);

    if reference.is_none() {
        if let Some(user_id) = user_id {
            match icare_db::get_user_location(&state.pool, user_id).await {
                Ok(saved) => reference = saved,
                Err(e) => tracing::warn!(user_id, error = %e, "saved location lookup failed"),
            }
        }
    }

    let Some(reference) = reference else {
        return ToolEnvelope::missing_location();
    };
    request.latitude = Some(reference.latitude);
    request.longitude = Some(reference.longitude);

    match load_candidates(&state.pool, kind, reference, kind.default_radius_km()).await {
        Ok(candidates) => run_tool(kind, &request, candidates, state.now()),
        Err(e) => {
            tracing::error!(kind = %kind, error = %e, "search tool candidate query failed");
            ToolEnvelope::search_failed(kind)
        }
    }
}
