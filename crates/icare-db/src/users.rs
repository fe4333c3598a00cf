//! Database operations for `users` and their saved location.

use chrono::{DateTime, Utc};
use icare_core::FacilityLocation;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub public_id: Uuid,
    pub email: String,
    pub term_agreed: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Saved location, when both coordinates are set.
    #[must_use]
    pub fn location(&self) -> Option<FacilityLocation> {
        FacilityLocation::from_parts(self.latitude, self.longitude)
    }
}

const USER_COLUMNS: &str = "id, public_id, email, term_agreed, latitude, longitude, \
                            location_updated_at, created_at, updated_at";

/// Creates a user. A duplicate email surfaces as a unique-violation
/// [`DbError::Sqlx`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    term_agreed: bool,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (public_id, email, term_agreed) \
         VALUES ($1, $2, $3) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(term_agreed)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no user has the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_user(pool: &PgPool, id: i64) -> Result<UserRow, DbError> {
    sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Saves the user's current location and stamps `location_updated_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no user has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_user_location(
    pool: &PgPool,
    id: i64,
    location: FacilityLocation,
) -> Result<UserRow, DbError> {
    sqlx::query_as::<_, UserRow>(&format!(
        "UPDATE users \
         SET latitude = $1, longitude = $2, location_updated_at = NOW(), updated_at = NOW() \
         WHERE id = $3 \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(location.latitude)
    .bind(location.longitude)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the user's saved location, `None` when none has been saved yet.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no user has the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_user_location(
    pool: &PgPool,
    id: i64,
) -> Result<Option<FacilityLocation>, DbError> {
    get_user(pool, id).await.map(|user| user.location())
}
