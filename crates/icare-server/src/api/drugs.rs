//! Proxy for the e-drug easy-info lookup.

use axum::{extract::State, Extension, Json};
use icare_publicdata::DrugInfo;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

const DRUG_SEARCH_ROWS: u32 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DrugSearchRequest {
    #[serde(default)]
    pub drug_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(super) enum DrugSearchStatus {
    Success,
    NoResults,
    Error,
}

#[derive(Debug, Serialize)]
pub(super) struct DrugSearchResult {
    #[serde(rename = "type")]
    kind: DrugSearchStatus,
    message: String,
    data: Vec<DrugInfo>,
}

impl DrugSearchResult {
    fn error(message: &str) -> Self {
        Self {
            kind: DrugSearchStatus::Error,
            message: message.to_string(),
            data: Vec::new(),
        }
    }
}

/// POST /api/v1/drugs/search
///
/// Answers 200 with a typed `error` result when the upstream lookup fails;
/// only a missing `drugName` is a client error.
pub(super) async fn search_drugs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<DrugSearchRequest>,
) -> Result<Json<ApiResponse<DrugSearchResult>>, ApiError> {
    let Some(drug_name) = body
        .drug_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    else {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "drugName is required",
        ));
    };

    let Some(client) = state.drugs.as_ref() else {
        return Ok(Json(ApiResponse::new(
            req_id.0,
            DrugSearchResult::error("약품 정보 서비스가 설정되지 않았습니다."),
        )));
    };

    let result = match client.search_drugs(drug_name, DRUG_SEARCH_ROWS).await {
        Ok(items) if items.is_empty() => DrugSearchResult {
            kind: DrugSearchStatus::NoResults,
            message: format!("'{drug_name}'에 대한 약품 정보를 찾을 수 없습니다."),
            data: items,
        },
        Ok(items) => DrugSearchResult {
            kind: DrugSearchStatus::Success,
            message: format!("'{drug_name}' 검색 결과 {}건입니다.", items.len()),
            data: items,
        },
        Err(e) => {
            tracing::warn!(error = %e, drug_name, "drug search failed");
            DrugSearchResult::error("약품 정보를 조회하는 중 오류가 발생했습니다.")
        }
    };

    Ok(Json(ApiResponse::new(req_id.0, result)))
}
