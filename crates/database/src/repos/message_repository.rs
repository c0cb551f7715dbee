//! Repository for message data access operations.

use crate::entities::{MessageKind, NewMessage, StoredMessage};
use crate::types::{MessageError, MessageResult};
use sqlx::{Row, SqlitePool};
use tracing::info;

/// Repository for message database operations
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new message with a server-assigned timestamp.
    pub async fn create(&self, request: &NewMessage) -> MessageResult<StoredMessage> {
        if request.body.is_empty() {
            return Err(MessageError::EmptyBody);
        }

        let public_id = cuid2::create_id();
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO messages (public_id, from_user, to_user, body, kind, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(&request.from_user)
        .bind(&request.to_user)
        .bind(&request.body)
        .bind(request.kind.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| MessageError::DatabaseError(e.to_string()))?;

        info!(
            public_id = %public_id,
            from = %request.from_user,
            to = %request.to_user,
            kind = %request.kind,
            "persisted message"
        );

        Ok(StoredMessage {
            id: result.last_insert_rowid(),
            public_id,
            from_user: request.from_user.clone(),
            to_user: request.to_user.clone(),
            body: request.body.clone(),
            kind: request.kind,
            created_at: now,
        })
    }

    /// Every message between the unordered pair, oldest first. Insertion id
    /// breaks timestamp ties so history reads are stable.
    pub async fn history_for_pair(&self, x: &str, y: &str) -> MessageResult<Vec<StoredMessage>> {
        let rows = sqlx::query(
            "SELECT id, public_id, from_user, to_user, body, kind, created_at
             FROM messages
             WHERE (from_user = ? AND to_user = ?) OR (from_user = ? AND to_user = ?)
             ORDER BY created_at ASC, id ASC",
        )
        .bind(x)
        .bind(y)
        .bind(y)
        .bind(x)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MessageError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(message_from_row).collect()
    }
}

fn message_from_row(row: sqlx::sqlite::SqliteRow) -> MessageResult<StoredMessage> {
    let kind_str: String = row
        .try_get("kind")
        .map_err(|e| MessageError::DatabaseError(e.to_string()))?;

    Ok(StoredMessage {
        id: row
            .try_get("id")
            .map_err(|e| MessageError::DatabaseError(e.to_string()))?,
        public_id: row
            .try_get("public_id")
            .map_err(|e| MessageError::DatabaseError(e.to_string()))?,
        from_user: row
            .try_get("from_user")
            .map_err(|e| MessageError::DatabaseError(e.to_string()))?,
        to_user: row
            .try_get("to_user")
            .map_err(|e| MessageError::DatabaseError(e.to_string()))?,
        body: row
            .try_get("body")
            .map_err(|e| MessageError::DatabaseError(e.to_string()))?,
        kind: MessageKind::from(kind_str.as_str()),
        created_at: row
            .try_get("created_at")
            .map_err(|e| MessageError::DatabaseError(e.to_string()))?,
    })
}
