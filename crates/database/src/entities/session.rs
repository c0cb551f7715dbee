//! Chat session entity definitions

use serde::{Deserialize, Serialize};

/// Durable record asserting two users have agreed to chat.
///
/// `user_a` and `user_b` are always stored in canonical (lexicographic)
/// order, so the unordered pair maps to exactly one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: i64,
    pub public_id: String,
    pub user_a: String,
    pub user_b: String,
    pub last_activity: String,
    pub created_at: String,
}

impl ChatSession {
    /// The other participant, from `username`'s point of view.
    pub fn peer_of(&self, username: &str) -> &str {
        if self.user_a == username {
            &self.user_b
        } else {
            &self.user_a
        }
    }
}

/// Order an unordered username pair canonically for storage and lookup.
pub fn canonical_pair<'a>(x: &'a str, y: &'a str) -> (&'a str, &'a str) {
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}
