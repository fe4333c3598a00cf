//! Database operations for `prescriptions` and their `medicines`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PrescriptionRow {
    pub id: i64,
    pub child_id: i64,
    pub pharmacy_name: String,
    pub prescription_number: String,
    pub prescription_date: NaiveDate,
    pub pharmacy_address: Option<String>,
    pub total_amount: Option<i32>,
    pub duration_days: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MedicineRow {
    pub id: i64,
    pub prescription_id: i64,
    pub name: String,
    pub dosage: String,
    pub frequency: i32,
    pub duration_days: i32,
}

#[derive(Debug, Clone)]
pub struct PrescriptionDetail {
    pub prescription: PrescriptionRow,
    pub medicines: Vec<MedicineRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMedicine {
    pub name: String,
    pub dosage: String,
    pub frequency: i32,
    pub duration_days: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPrescription {
    pub pharmacy_name: String,
    pub prescription_date: NaiveDate,
    #[serde(default)]
    pub pharmacy_address: Option<String>,
    #[serde(default)]
    pub total_amount: Option<i32>,
    #[serde(default)]
    pub duration_days: Option<i32>,
    #[serde(default)]
    pub medicines: Vec<NewMedicine>,
}

const PRESCRIPTION_COLUMNS: &str = "id, child_id, pharmacy_name, prescription_number, \
                                    prescription_date, pharmacy_address, total_amount, \
                                    duration_days, created_at";

/// `RX-` followed by eight hex digits.
fn new_prescription_number() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("RX-{}", &id[..8])
}

/// Inserts a prescription and its medicines in one transaction.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the child does not exist, or
/// [`DbError::Sqlx`] if any insert fails.
pub async fn create_prescription(
    pool: &PgPool,
    child_id: i64,
    new: &NewPrescription,
) -> Result<PrescriptionDetail, DbError> {
    let mut tx = pool.begin().await?;

    let prescription = sqlx::query_as::<_, PrescriptionRow>(&format!(
        "INSERT INTO prescriptions \
             (child_id, pharmacy_name, prescription_number, prescription_date, \
              pharmacy_address, total_amount, duration_days) \
         SELECT id, $2, $3, $4, $5, $6, $7 FROM children WHERE id = $1 \
         RETURNING {PRESCRIPTION_COLUMNS}"
    ))
    .bind(child_id)
    .bind(&new.pharmacy_name)
    .bind(new_prescription_number())
    .bind(new.prescription_date)
    .bind(&new.pharmacy_address)
    .bind(new.total_amount)
    .bind(new.duration_days)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(DbError::NotFound)?;

    let medicines = if new.medicines.is_empty() {
        Vec::new()
    } else {
        let names: Vec<&str> = new.medicines.iter().map(|m| m.name.as_str()).collect();
        let dosages: Vec<&str> = new.medicines.iter().map(|m| m.dosage.as_str()).collect();
        let frequencies: Vec<i32> = new.medicines.iter().map(|m| m.frequency).collect();
        let durations: Vec<i32> = new.medicines.iter().map(|m| m.duration_days).collect();

        sqlx::query_as::<_, MedicineRow>(
            "INSERT INTO medicines (prescription_id, name, dosage, frequency, duration_days) \
             SELECT $1, * FROM UNNEST($2::text[], $3::text[], $4::int4[], $5::int4[]) \
             RETURNING id, prescription_id, name, dosage, frequency, duration_days",
        )
        .bind(prescription.id)
        .bind(&names)
        .bind(&dosages)
        .bind(&frequencies)
        .bind(&durations)
        .fetch_all(&mut *tx)
        .await?
    };

    tx.commit().await?;

    Ok(PrescriptionDetail {
        prescription,
        medicines,
    })
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no prescription has the given `id`, or
/// [`DbError::Sqlx`] if a query fails.
pub async fn get_prescription(pool: &PgPool, id: i64) -> Result<PrescriptionDetail, DbError> {
    let prescription = sqlx::query_as::<_, PrescriptionRow>(&format!(
        "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    let medicines = sqlx::query_as::<_, MedicineRow>(
        "SELECT id, prescription_id, name, dosage, frequency, duration_days \
         FROM medicines \
         WHERE prescription_id = $1 \
         ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(PrescriptionDetail {
        prescription,
        medicines,
    })
}

/// Prescriptions of one child, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_prescriptions_for_child(
    pool: &PgPool,
    child_id: i64,
) -> Result<Vec<PrescriptionRow>, DbError> {
    let rows = sqlx::query_as::<_, PrescriptionRow>(&format!(
        "SELECT {PRESCRIPTION_COLUMNS} \
         FROM prescriptions \
         WHERE child_id = $1 \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(child_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deletes a prescription; its medicines go with it.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no prescription has the given `id`, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_prescription(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM prescriptions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prescription_number_has_rx_prefix_and_eight_hex_digits() {
        let number = new_prescription_number();
        let (prefix, digits) = number.split_at(3);
        assert_eq!(prefix, "RX-");
        assert_eq!(digits.len(), 8);
        assert!(digits.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn new_prescription_defaults_optional_fields() {
        let new: NewPrescription = serde_json::from_str(
            r#"{"pharmacy_name": "온누리약국", "prescription_date": "2024-03-02"}"#,
        )
        .unwrap();
        assert!(new.medicines.is_empty());
        assert!(new.total_amount.is_none());
    }
}
