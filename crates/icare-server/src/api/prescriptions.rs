//! Prescriptions recorded per child, with their medicines.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use icare_db::{NewPrescription, PrescriptionDetail, PrescriptionRow};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct PrescriptionItem {
    id: i64,
    child_id: i64,
    pharmacy_name: String,
    prescription_number: String,
    prescription_date: NaiveDate,
    pharmacy_address: Option<String>,
    total_amount: Option<i32>,
    duration_days: Option<i32>,
    /// Last day of the course: `prescription_date + duration_days`.
    end_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    medicines: Option<Vec<MedicineItem>>,
}

#[derive(Debug, Serialize)]
pub(super) struct MedicineItem {
    id: i64,
    name: String,
    dosage: String,
    frequency: i32,
    duration_days: i32,
    /// Doses over the whole course.
    total_count: i32,
}

impl MedicineItem {
    fn new(id: i64, name: String, dosage: String, frequency: i32, duration_days: i32) -> Self {
        Self {
            id,
            name,
            dosage,
            frequency,
            duration_days,
            total_count: frequency.saturating_mul(duration_days),
        }
    }
}

fn end_date(start: NaiveDate, duration_days: Option<i32>) -> Option<NaiveDate> {
    let days = u64::try_from(duration_days?).ok()?;
    start.checked_add_days(Days::new(days))
}

impl PrescriptionItem {
    fn from_row(row: PrescriptionRow, medicines: Option<Vec<MedicineItem>>) -> Self {
        Self {
            id: row.id,
            child_id: row.child_id,
            pharmacy_name: row.pharmacy_name,
            prescription_number: row.prescription_number,
            prescription_date: row.prescription_date,
            pharmacy_address: row.pharmacy_address,
            total_amount: row.total_amount,
            duration_days: row.duration_days,
            end_date: end_date(row.prescription_date, row.duration_days),
            created_at: row.created_at,
            medicines,
        }
    }
}

impl From<PrescriptionDetail> for PrescriptionItem {
    fn from(detail: PrescriptionDetail) -> Self {
        let medicines = detail
            .medicines
            .into_iter()
            .map(|m| MedicineItem::new(m.id, m.name, m.dosage, m.frequency, m.duration_days))
            .collect();
        Self::from_row(detail.prescription, Some(medicines))
    }
}

fn validate(request_id: &str, body: &NewPrescription) -> Result<(), ApiError> {
    if body.pharmacy_name.trim().is_empty() {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "pharmacy_name is required",
        ));
    }
    if body.total_amount.is_some_and(|a| a < 0) || body.duration_days.is_some_and(|d| d <= 0) {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "total_amount must be non-negative and duration_days positive",
        ));
    }
    for medicine in &body.medicines {
        if medicine.name.trim().is_empty() || medicine.frequency <= 0 || medicine.duration_days <= 0
        {
            return Err(ApiError::new(
                request_id,
                "validation_error",
                "each medicine needs a name and a positive frequency and duration_days",
            ));
        }
    }
    Ok(())
}

/// POST /api/v1/children/{id}/prescriptions
pub(super) async fn create_prescription(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(child_id): Path<i64>,
    Json(body): Json<NewPrescription>,
) -> Result<(StatusCode, Json<ApiResponse<PrescriptionItem>>), ApiError> {
    validate(&req_id.0, &body)?;
    icare_db::get_child(&state.pool, child_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let detail = icare_db::create_prescription(&state.pool, child_id, &body)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(
        child_id,
        prescription_number = %detail.prescription.prescription_number,
        medicines = detail.medicines.len(),
        "prescription recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(req_id.0, detail.into())),
    ))
}

/// GET /api/v1/children/{id}/prescriptions, newest first and without
/// medicines.
pub(super) async fn list_prescriptions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(child_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<PrescriptionItem>>>, ApiError> {
    icare_db::get_child(&state.pool, child_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let rows = icare_db::list_prescriptions_for_child(&state.pool, child_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        rows.into_iter()
            .map(|row| PrescriptionItem::from_row(row, None))
            .collect(),
    )))
}

/// GET /api/v1/prescriptions/{id}
pub(super) async fn get_prescription(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PrescriptionItem>>, ApiError> {
    let detail = icare_db::get_prescription(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, detail.into())))
}

/// DELETE /api/v1/prescriptions/{id}
pub(super) async fn delete_prescription(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    icare_db::delete_prescription(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        serde_json::json!({ "deleted": true }),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: serde_json::Value) -> NewPrescription {
        serde_json::from_value(json).expect("prescription body")
    }

    #[test]
    fn validate_requires_pharmacy_name() {
        let req = body(serde_json::json!({
            "pharmacy_name": "  ",
            "prescription_date": "2024-03-01",
        }));
        assert!(validate("r", &req).is_err());
    }

    #[test]
    fn validate_rejects_zero_frequency() {
        let req = body(serde_json::json!({
            "pharmacy_name": "온누리약국",
            "prescription_date": "2024-03-01",
            "medicines": [{ "name": "타이레놀", "dosage": "5ml", "frequency": 0, "duration_days": 3 }],
        }));
        assert!(validate("r", &req).is_err());
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn end_date_adds_duration_to_prescription_date() {
        assert_eq!(end_date(date(2024, 2, 27), Some(3)), Some(date(2024, 3, 1)));
        assert_eq!(end_date(date(2024, 2, 27), None), None);
        assert_eq!(end_date(date(2024, 2, 27), Some(-1)), None);
        assert_eq!(end_date(NaiveDate::MAX, Some(1)), None);
    }

    #[test]
    fn medicine_total_count_is_frequency_times_days() {
        let item = MedicineItem::new(1, "타이레놀".into(), "5ml".into(), 3, 5);
        assert_eq!(item.total_count, 15);

        let huge = MedicineItem::new(2, "x".into(), "1".into(), i32::MAX, 2);
        assert_eq!(huge.total_count, i32::MAX);
    }

    #[test]
    fn validate_accepts_complete_body() {
        let req = body(serde_json::json!({
            "pharmacy_name": "온누리약국",
            "prescription_date": "2024-03-01",
            "total_amount": 4500,
            "duration_days": 3,
            "medicines": [{ "name": "타이레놀", "dosage": "5ml", "frequency": 3, "duration_days": 3 }],
        }));
        assert!(validate("r", &req).is_ok());
    }
}
