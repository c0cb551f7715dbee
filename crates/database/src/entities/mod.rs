//! Entity definitions for the Vicinity store

pub mod message;
pub mod session;
pub mod user;

pub use message::{MessageKind, NewMessage, StoredMessage};
pub use session::{canonical_pair, ChatSession};
pub use user::{GeoPoint, User};
