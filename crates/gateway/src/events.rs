//! Wire protocol for the WebSocket surface
//!
//! JSON frames tagged by `type`, kebab-case. Client events drive the
//! presence registry, the handshake coordinator, and the message relay;
//! server events are addressed to delivery groups by identity.

use serde::{Deserialize, Serialize};
use vicinity_database::MessageKind;

/// Events received from a client connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Bind this connection to a logical identity.
    Register { username: String },
    /// Ask `to` for a chat, or short-circuit if a session already exists.
    ChatRequest { to: String },
    /// Accept a pending request from `from`, creating the session.
    ChatAccept { from: String },
    /// Decline a pending request from `to`'s point of view.
    ChatDeny { to: String },
    /// Send a message to `to`.
    Message {
        to: String,
        body: String,
        #[serde(default)]
        kind: MessageKind,
    },
}

/// Events delivered to client connections
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Registration acknowledged; the connection now receives deliveries
    /// addressed to `username`.
    Registered { username: String },
    /// `from` wants to chat.
    ChatRequest { from: String },
    /// The handshake with `from` resolved active.
    ChatAccepted { from: String },
    /// `from` declined the request.
    ChatRequestDenied { from: String },
    /// A relayed message. The sender's own connections receive the echo too.
    Message {
        from: String,
        body: String,
        kind: MessageKind,
        timestamp: String,
    },
    /// Something about the last client event failed. Scoped to this
    /// connection only.
    Error { message: String },
}
