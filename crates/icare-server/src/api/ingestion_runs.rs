use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct IngestionRunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct IngestionRunItem {
    ingestion_run_id: Uuid,
    run_type: String,
    trigger_source: String,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    records_processed: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<icare_db::IngestionRunRow> for IngestionRunItem {
    fn from(row: icare_db::IngestionRunRow) -> Self {
        Self {
            ingestion_run_id: row.public_id,
            run_type: row.run_type,
            trigger_source: row.trigger_source,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            records_processed: row.records_processed,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

/// GET /api/v1/ingestion-runs
pub(super) async fn list_ingestion_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<IngestionRunsQuery>,
) -> Result<Json<ApiResponse<Vec<IngestionRunItem>>>, ApiError> {
    let rows = icare_db::list_ingestion_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        rows.into_iter().map(IngestionRunItem::from).collect(),
    )))
}

#[cfg(test)]
mod tests {
    use super::IngestionRunItem;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn ingestion_run_item_is_serializable() {
        let item = IngestionRunItem {
            ingestion_run_id: Uuid::new_v4(),
            run_type: "pharmacies".to_string(),
            trigger_source: "scheduler".to_string(),
            status: "succeeded".to_string(),
            started_at: Some(Utc::now()),
            completed_at: Some(Utc::now()),
            records_processed: 23_512,
            error_message: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["run_type"], "pharmacies");
        assert_eq!(json["records_processed"], 23_512);
        assert!(json["error_message"].is_null());
    }
}
