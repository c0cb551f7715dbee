//! Shared application state for the gateway

use sqlx::SqlitePool;
use std::sync::Arc;
use vicinity_config::{AppConfig, DiscoveryConfig};
use vicinity_database::{MessageRepository, SessionRepository, UserRepository};
use vicinity_presence::PresenceRegistry;

use crate::error::{GatewayError, GatewayResult};
use crate::events::ServerEvent;

/// Shared application state: repositories over one pool, the presence
/// registry, and the discovery settings.
#[derive(Clone)]
pub struct GatewayState {
    pub pool: SqlitePool,
    pub users: Arc<UserRepository>,
    pub sessions: Arc<SessionRepository>,
    pub messages: Arc<MessageRepository>,
    pub presence: PresenceRegistry<ServerEvent>,
    pub discovery: DiscoveryConfig,
}

impl GatewayState {
    /// Create a new gateway state over an initialized pool
    pub fn new(pool: SqlitePool, discovery: DiscoveryConfig) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            sessions: Arc::new(SessionRepository::new(pool.clone())),
            messages: Arc::new(MessageRepository::new(pool.clone())),
            presence: PresenceRegistry::new(),
            discovery,
            pool,
        }
    }

    /// Create gateway state from application configuration
    pub async fn from_config(config: &AppConfig) -> GatewayResult<Self> {
        let pool = vicinity_database::initialize_database(&config.database)
            .await
            .map_err(|e| {
                GatewayError::StorageError(format!("failed to initialize database: {}", e))
            })?;

        Ok(Self::new(pool, config.discovery.clone()))
    }
}
