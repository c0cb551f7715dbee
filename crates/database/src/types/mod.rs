//! Shared result aliases for the database layer

pub mod errors;

pub use errors::{DatabaseError, MessageError, SessionError, UserError};

pub type DatabaseResult<T> = Result<T, DatabaseError>;
pub type UserResult<T> = Result<T, UserError>;
pub type SessionResult<T> = Result<T, SessionError>;
pub type MessageResult<T> = Result<T, MessageError>;
