//! Repository for user data access operations.

use crate::entities::{GeoPoint, User};
use crate::types::{UserError, UserResult};
use sqlx::{Row, SqlitePool};
use tracing::info;

/// Repository for user database operations
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ensure a row exists for `username`, creating it on first sight.
    ///
    /// Registration is idempotent: re-registering an existing username only
    /// bumps `updated_at`.
    pub async fn register(&self, username: &str) -> UserResult<User> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO users (username, created_at, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(username) DO UPDATE SET updated_at = excluded.updated_at",
        )
        .bind(username)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        self.find_by_username(username)
            .await?
            .ok_or(UserError::UserNotFound)
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, longitude, latitude, created_at, updated_at
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(user_from_row).transpose()
    }

    /// Record the user's last reported coordinate.
    pub async fn set_location(&self, username: &str, location: GeoPoint) -> UserResult<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE users SET longitude = ?, latitude = ?, updated_at = ? WHERE username = ?",
        )
        .bind(location.longitude)
        .bind(location.latitude)
        .bind(&now)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        info!(
            username = username,
            longitude = location.longitude,
            latitude = location.latitude,
            "updated user location"
        );

        Ok(())
    }

    /// All users other than `username`. Discovery ranks and filters these
    /// in-process; users without a recorded location are included so the
    /// no-location fallback can return the full roster.
    pub async fn list_peers(&self, username: &str) -> UserResult<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, username, longitude, latitude, created_at, updated_at
             FROM users WHERE username != ? ORDER BY username ASC",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(user_from_row).collect()
    }
}

fn user_from_row(row: sqlx::sqlite::SqliteRow) -> UserResult<User> {
    let longitude: Option<f64> = row
        .try_get("longitude")
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;
    let latitude: Option<f64> = row
        .try_get("latitude")
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

    let location = match (longitude, latitude) {
        (Some(longitude), Some(latitude)) => Some(GeoPoint::new(longitude, latitude)),
        _ => None,
    };

    Ok(User {
        id: row
            .try_get("id")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        username: row
            .try_get("username")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        location,
        created_at: row
            .try_get("created_at")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| UserError::DatabaseError(e.to_string()))?,
    })
}
