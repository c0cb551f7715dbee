//! WebSocket event handlers: presence registration, the chat handshake
//! coordinator, and the message relay.
//!
//! Every handler runs inside one connection's task. Cross-connection state
//! lives in the presence registry and the store; races between connections
//! (notably two accepts for the same pair) are serialized by the store's
//! atomic find-or-create, never by handler-side sequencing.

use tokio::sync::mpsc;
use tracing::{debug, warn};
use vicinity_database::{MessageKind, NewMessage};
use vicinity_presence::ConnectionId;

use crate::error::{GatewayError, GatewayResult};
use crate::events::{ClientEvent, ServerEvent};
use crate::state::GatewayState;

/// Dispatch one client event. An `Err` is reported back to the originating
/// connection as an `error` event by the connection loop; it never affects
/// other connections.
pub async fn handle_client_event(
    event: ClientEvent,
    connection: ConnectionId,
    out_tx: &mpsc::Sender<ServerEvent>,
    state: &GatewayState,
) -> GatewayResult<()> {
    match event {
        ClientEvent::Register { username } => {
            handle_register(username, connection, out_tx, state).await
        }
        ClientEvent::ChatRequest { to } => handle_chat_request(to, connection, out_tx, state).await,
        ClientEvent::ChatAccept { from } => handle_chat_accept(from, connection, state).await,
        ClientEvent::ChatDeny { to } => handle_chat_deny(to, connection, state).await,
        ClientEvent::Message { to, body, kind } => {
            handle_message(to, body, kind, connection, state).await
        }
    }
}

/// Bind the connection into the identity's delivery group and make sure the
/// user row exists. Re-registration moves only this connection.
async fn handle_register(
    username: String,
    connection: ConnectionId,
    out_tx: &mpsc::Sender<ServerEvent>,
    state: &GatewayState,
) -> GatewayResult<()> {
    let username = username.trim().to_string();
    if username.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "username must not be empty".to_string(),
        ));
    }

    state.users.register(&username).await?;
    state
        .presence
        .bind(connection, &username, out_tx.clone())
        .await;

    debug!(%connection, username, "connection registered");

    out_tx
        .send(ServerEvent::Registered { username })
        .await
        .map_err(|_| GatewayError::InternalError("connection closed".to_string()))?;
    Ok(())
}

/// Handshake step one. An existing session short-circuits straight to an
/// accept notification for the initiator; otherwise the request is forwarded
/// to the target's delivery group and the pending state lives only in the
/// target's hands.
async fn handle_chat_request(
    to: String,
    connection: ConnectionId,
    out_tx: &mpsc::Sender<ServerEvent>,
    state: &GatewayState,
) -> GatewayResult<()> {
    let from = require_registered(state, connection).await?;
    if to == from {
        return Err(GatewayError::InvalidRequest(
            "cannot request a chat with yourself".to_string(),
        ));
    }

    if state.sessions.find_for_pair(&from, &to).await?.is_some() {
        // Implicit auto-accept: tell the initiator only, no event to target.
        out_tx
            .send(ServerEvent::ChatAccepted { from: to })
            .await
            .map_err(|_| GatewayError::InternalError("connection closed".to_string()))?;
        return Ok(());
    }

    let reached = state
        .presence
        .deliver(&to, ServerEvent::ChatRequest { from: from.clone() })
        .await;
    debug!(from, to, reached, "forwarded chat request");
    Ok(())
}

/// Handshake resolution. Creation is an atomic find-or-create keyed by the
/// unordered pair, so a race against a concurrent accept from the other
/// direction reuses the existing session instead of duplicating it. Storage
/// failures propagate to the accepting connection and leave no partial row.
async fn handle_chat_accept(
    from: String,
    connection: ConnectionId,
    state: &GatewayState,
) -> GatewayResult<()> {
    let responder = require_registered(state, connection).await?;

    let session = state.sessions.find_or_create(&responder, &from).await?;
    debug!(
        session = %session.public_id,
        responder,
        initiator = from,
        "handshake resolved active"
    );

    state
        .presence
        .deliver(&from, ServerEvent::ChatAccepted { from: responder })
        .await;
    Ok(())
}

/// Denial notifies the initiator and mutates nothing; the pair is back to
/// square one.
async fn handle_chat_deny(
    to: String,
    connection: ConnectionId,
    state: &GatewayState,
) -> GatewayResult<()> {
    let from = require_registered(state, connection).await?;

    state
        .presence
        .deliver(&to, ServerEvent::ChatRequestDenied { from })
        .await;
    Ok(())
}

/// Message relay: persist first, then fan out to both participants' delivery
/// groups. The sender's own groups get the echo so its other open sessions
/// stay consistent. The session-activity bump is best-effort and does not
/// gate delivery.
async fn handle_message(
    to: String,
    body: String,
    kind: MessageKind,
    connection: ConnectionId,
    state: &GatewayState,
) -> GatewayResult<()> {
    let from = require_registered(state, connection).await?;
    if to.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "message target must not be empty".to_string(),
        ));
    }

    let stored = state
        .messages
        .create(&NewMessage {
            from_user: from.clone(),
            to_user: to.clone(),
            body,
            kind,
        })
        .await?;

    if let Err(error) = state.sessions.touch_last_activity(&from, &to).await {
        warn!(from, to, %error, "failed to update session activity");
    }

    let event = ServerEvent::Message {
        from: from.clone(),
        body: stored.body,
        kind: stored.kind,
        timestamp: stored.created_at,
    };

    let reached_to = state.presence.deliver(&to, event.clone()).await;
    let reached_from = if from != to {
        state.presence.deliver(&from, event).await
    } else {
        0
    };
    debug!(from, to, reached_to, reached_from, "relayed message");

    Ok(())
}

async fn require_registered(
    state: &GatewayState,
    connection: ConnectionId,
) -> GatewayResult<String> {
    state
        .presence
        .identity_of(connection)
        .await
        .ok_or_else(|| GatewayError::InvalidRequest("register before sending events".to_string()))
}
