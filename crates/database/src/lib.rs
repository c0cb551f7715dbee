//! Vicinity Database Crate
//!
//! Durable storage for the Vicinity backend: users and their locations,
//! chat sessions keyed by unordered user pair, and persisted messages.
//! Connection management, migrations, and one repository per entity.

use sqlx::SqlitePool;
use vicinity_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::open_pool;
pub use migrations::run_migrations;

pub use repos::{MessageRepository, SessionRepository, UserRepository};

pub use entities::{
    message::{MessageKind, NewMessage, StoredMessage},
    session::{canonical_pair, ChatSession},
    user::{GeoPoint, User},
};

pub use types::{
    errors::{DatabaseError, MessageError, SessionError, UserError},
    DatabaseResult, MessageResult, SessionResult, UserResult,
};

/// Open the database and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = open_pool(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    Ok(pool)
}
