//! Repository for chat session data access operations.

use crate::entities::{canonical_pair, ChatSession};
use crate::types::{SessionError, SessionResult};
use sqlx::{Row, SqlitePool};
use tracing::info;

/// Repository for chat session database operations
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find the session for an unordered user pair.
    pub async fn find_for_pair(&self, x: &str, y: &str) -> SessionResult<Option<ChatSession>> {
        let (user_a, user_b) = canonical_pair(x, y);

        let row = sqlx::query(
            "SELECT id, public_id, user_a, user_b, last_activity, created_at
             FROM chat_sessions WHERE user_a = ? AND user_b = ?",
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        row.map(session_from_row).transpose()
    }

    /// Atomic find-or-create for the unordered pair.
    ///
    /// The conditional insert rides on the `UNIQUE(user_a, user_b)` key: of
    /// any number of concurrent accepts (from either direction) exactly one
    /// insert wins and everyone reads back the same surviving row. A lost
    /// insert leaves no partial state.
    pub async fn find_or_create(&self, x: &str, y: &str) -> SessionResult<ChatSession> {
        if x == y {
            return Err(SessionError::IdenticalUsers);
        }

        let (user_a, user_b) = canonical_pair(x, y);
        let public_id = cuid2::create_id();
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO chat_sessions (public_id, user_a, user_b, last_activity, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_a, user_b) DO NOTHING",
        )
        .bind(&public_id)
        .bind(user_a)
        .bind(user_b)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        if result.rows_affected() > 0 {
            info!(
                public_id = %public_id,
                user_a = user_a,
                user_b = user_b,
                "created chat session"
            );
        }

        self.find_for_pair(user_a, user_b)
            .await?
            .ok_or(SessionError::SessionNotFound)
    }

    /// Best-effort bump of `last_activity` for the pair. Returns whether a
    /// session row existed; callers treat `false` as a no-op, not an error.
    pub async fn touch_last_activity(&self, x: &str, y: &str) -> SessionResult<bool> {
        let (user_a, user_b) = canonical_pair(x, y);
        let now = chrono::Utc::now().to_rfc3339();

        let result =
            sqlx::query("UPDATE chat_sessions SET last_activity = ? WHERE user_a = ? AND user_b = ?")
                .bind(&now)
                .bind(user_a)
                .bind(user_b)
                .execute(&self.pool)
                .await
                .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// All sessions `username` participates in, most recently active first.
    pub async fn list_for_user(&self, username: &str) -> SessionResult<Vec<ChatSession>> {
        let rows = sqlx::query(
            "SELECT id, public_id, user_a, user_b, last_activity, created_at
             FROM chat_sessions WHERE user_a = ? OR user_b = ?
             ORDER BY last_activity DESC",
        )
        .bind(username)
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(session_from_row).collect()
    }

    /// Delete the pair's session together with every message between the
    /// pair, in one transaction. Returns the number of messages removed.
    pub async fn remove_with_messages(&self, x: &str, y: &str) -> SessionResult<u64> {
        let (user_a, user_b) = canonical_pair(x, y);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        sqlx::query("DELETE FROM chat_sessions WHERE user_a = ? AND user_b = ?")
            .bind(user_a)
            .bind(user_b)
            .execute(&mut *tx)
            .await
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        let messages = sqlx::query(
            "DELETE FROM messages
             WHERE (from_user = ? AND to_user = ?) OR (from_user = ? AND to_user = ?)",
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .execute(&mut *tx)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        info!(
            user_a = user_a,
            user_b = user_b,
            messages_removed = messages.rows_affected(),
            "removed chat session"
        );

        Ok(messages.rows_affected())
    }
}

fn session_from_row(row: sqlx::sqlite::SqliteRow) -> SessionResult<ChatSession> {
    Ok(ChatSession {
        id: row
            .try_get("id")
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?,
        public_id: row
            .try_get("public_id")
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?,
        user_a: row
            .try_get("user_a")
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?,
        user_b: row
            .try_get("user_b")
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?,
        last_activity: row
            .try_get("last_activity")
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::open_pool;
    use crate::migrations::run_migrations;
    use std::sync::Arc;
    use tempfile::TempDir;
    use vicinity_config::DatabaseConfig;

    async fn create_test_pool() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_sessions.db");

        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 5,
        };

        let pool = open_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        (pool, temp_dir)
    }

    #[tokio::test]
    async fn find_or_create_is_direction_agnostic() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = SessionRepository::new(pool);

        let first = repo.find_or_create("bob", "alice").await.unwrap();
        let second = repo.find_or_create("alice", "bob").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.user_a, "alice");
        assert_eq!(first.user_b, "bob");
    }

    #[tokio::test]
    async fn find_or_create_rejects_identical_users() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = SessionRepository::new(pool);

        let err = repo.find_or_create("alice", "alice").await.unwrap_err();
        assert!(matches!(err, SessionError::IdenticalUsers));
    }

    #[tokio::test]
    async fn concurrent_accepts_create_exactly_one_session() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = Arc::new(SessionRepository::new(pool.clone()));

        let mut tasks = Vec::new();
        for i in 0..16 {
            let repo = Arc::clone(&repo);
            tasks.push(tokio::spawn(async move {
                // Half the accepts arrive from each direction.
                if i % 2 == 0 {
                    repo.find_or_create("alice", "bob").await
                } else {
                    repo.find_or_create("bob", "alice").await
                }
            }));
        }

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap().unwrap().id);
        }
        assert!(ids.windows(2).all(|w| w[0] == w[1]));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn touch_last_activity_without_session_is_noop() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = SessionRepository::new(pool);

        assert!(!repo.touch_last_activity("alice", "bob").await.unwrap());

        repo.find_or_create("alice", "bob").await.unwrap();
        assert!(repo.touch_last_activity("bob", "alice").await.unwrap());
    }

    #[tokio::test]
    async fn list_for_user_orders_by_recent_activity() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = SessionRepository::new(pool);

        repo.find_or_create("alice", "bob").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.find_or_create("alice", "carol").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.touch_last_activity("alice", "bob").await.unwrap();

        let sessions = repo.list_for_user("alice").await.unwrap();
        let peers: Vec<&str> = sessions.iter().map(|s| s.peer_of("alice")).collect();
        assert_eq!(peers, vec!["bob", "carol"]);
    }

    #[tokio::test]
    async fn remove_with_messages_cascades() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = SessionRepository::new(pool.clone());

        repo.find_or_create("alice", "bob").await.unwrap();
        for (from, to) in [("alice", "bob"), ("bob", "alice")] {
            sqlx::query(
                "INSERT INTO messages (public_id, from_user, to_user, body, kind, created_at)
                 VALUES (?, ?, ?, 'hi', 'text', ?)",
            )
            .bind(cuid2::create_id())
            .bind(from)
            .bind(to)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&pool)
            .await
            .unwrap();
        }

        let removed = repo.remove_with_messages("bob", "alice").await.unwrap();
        assert_eq!(removed, 2);

        assert!(repo.find_for_pair("alice", "bob").await.unwrap().is_none());
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
