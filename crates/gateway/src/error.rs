//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::StorageError(_) | GatewayError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = json!({
            "error": status.as_str(),
            "message": self.to_string(),
        });

        (status, Json(error_response)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<vicinity_database::UserError> for GatewayError {
    fn from(error: vicinity_database::UserError) -> Self {
        match error {
            vicinity_database::UserError::UserNotFound => {
                GatewayError::NotFound("User not found".to_string())
            }
            vicinity_database::UserError::UsernameAlreadyExists => {
                GatewayError::InvalidRequest("Username already exists".to_string())
            }
            vicinity_database::UserError::DatabaseError(msg) => GatewayError::StorageError(msg),
        }
    }
}

impl From<vicinity_database::SessionError> for GatewayError {
    fn from(error: vicinity_database::SessionError) -> Self {
        match error {
            vicinity_database::SessionError::SessionNotFound => {
                GatewayError::NotFound("Chat session not found".to_string())
            }
            vicinity_database::SessionError::IdenticalUsers => {
                GatewayError::InvalidRequest("Cannot open a chat session with yourself".to_string())
            }
            vicinity_database::SessionError::DatabaseError(msg) => GatewayError::StorageError(msg),
        }
    }
}

impl From<vicinity_database::MessageError> for GatewayError {
    fn from(error: vicinity_database::MessageError) -> Self {
        match error {
            vicinity_database::MessageError::EmptyBody => {
                GatewayError::InvalidRequest("Message body must not be empty".to_string())
            }
            vicinity_database::MessageError::DatabaseError(msg) => GatewayError::StorageError(msg),
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(error: sqlx::Error) -> Self {
        GatewayError::StorageError(error.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        GatewayError::InvalidRequest(format!("JSON serialization error: {}", error))
    }
}
