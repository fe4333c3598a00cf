use sqlx::PgPool;

use super::types::HospitalRow;
use crate::{BoundingBox, DbError};

/// Hospitals whose coordinates fall inside `bounds`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_hospitals_in_bounds(
    pool: &PgPool,
    bounds: BoundingBox,
) -> Result<Vec<HospitalRow>, DbError> {
    let rows = sqlx::query_as::<_, HospitalRow>(
        "SELECT id, ykiho, name, address, phone, department, hospital_type, \
                latitude, longitude, weekday_hours, saturday_hours, sunday_hours, \
                reception_hours, lunch_time, sunday_closed, holiday_info, \
                created_at, updated_at \
         FROM hospitals \
         WHERE latitude BETWEEN $1 AND $2 \
           AND longitude BETWEEN $3 AND $4",
    )
    .bind(bounds.min_latitude)
    .bind(bounds.max_latitude)
    .bind(bounds.min_longitude)
    .bind(bounds.max_longitude)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_hospitals(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM hospitals")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
