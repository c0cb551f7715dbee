//! Error types for the database layer

use thiserror::Error;

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),

    #[error("Database query error: {0}")]
    QueryError(String),
}

/// User-specific database errors
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    UserNotFound,

    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Chat-session-specific database errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Chat session not found")]
    SessionNotFound,

    #[error("A chat session requires two distinct users")]
    IdenticalUsers,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Message-specific database errors
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Message body must not be empty")]
    EmptyBody,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
