use sqlx::PgPool;

use super::types::PharmacyRow;
use crate::{BoundingBox, DbError};

/// Active pharmacies whose coordinates fall inside `bounds`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_pharmacies_in_bounds(
    pool: &PgPool,
    bounds: BoundingBox,
) -> Result<Vec<PharmacyRow>, DbError> {
    let rows = sqlx::query_as::<_, PharmacyRow>(
        "SELECT id, hpid, name, address, tel, fax, latitude, longitude, map_info, etc, \
                mon_start, mon_end, tue_start, tue_end, wed_start, wed_end, \
                thu_start, thu_end, fri_start, fri_end, sat_start, sat_end, \
                sun_start, sun_end, is_active, last_seen_at, created_at, updated_at \
         FROM pharmacies \
         WHERE is_active = TRUE \
           AND latitude BETWEEN $1 AND $2 \
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
