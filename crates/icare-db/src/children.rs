//! Database operations for `children`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChildRow {
    pub id: i64,
    pub user_id: i64,
    pub child_name: String,
    pub created_at: DateTime<Utc>,
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the parent user does not exist, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn create_child(
    pool: &PgPool,
    user_id: i64,
    child_name: &str,
) -> Result<ChildRow, DbError> {
    // Insert through a SELECT so a missing user yields no row instead of an
    // FK violation.
    sqlx::query_as::<_, ChildRow>(
        "INSERT INTO children (user_id, child_name) \
         SELECT id, $2 FROM users WHERE id = $1 \
         RETURNING id, user_id, child_name, created_at",
    )
    .bind(user_id)
    .bind(child_name)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no child has the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_child(pool: &PgPool, id: i64) -> Result<ChildRow, DbError> {
    sqlx::query_as::<_, ChildRow>(
        "SELECT id, user_id, child_name, created_at FROM children WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Children of one user in registration order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_children_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<ChildRow>, DbError> {
    let rows = sqlx::query_as::<_, ChildRow>(
        "SELECT id, user_id, child_name, created_at \
         FROM children \
         WHERE user_id = $1 \
         ORDER BY created_at, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
