//! Message entity definitions

use serde::{Deserialize, Serialize};

/// A persisted message between two users. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub public_id: String,
    pub from_user: String,
    pub to_user: String,
    pub body: String,
    pub kind: MessageKind,
    pub created_at: String,
}

/// Request for persisting a new message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub from_user: String,
    pub to_user: String,
    pub body: String,
    pub kind: MessageKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Video,
    Voice,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Video => "video",
            MessageKind::Voice => "voice",
        }
    }
}

impl Default for MessageKind {
    fn default() -> Self {
        MessageKind::Text
    }
}

impl From<&str> for MessageKind {
    fn from(s: &str) -> Self {
        match s {
            "image" => MessageKind::Image,
            "video" => MessageKind::Video,
            "voice" => MessageKind::Voice,
            _ => MessageKind::Text,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
