//! Chat history, active chats, and chat removal endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use vicinity_database::StoredMessage;

use crate::error::GatewayResult;
use crate::rest::CallerIdentity;
use crate::state::GatewayState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub from: String,
    pub to: String,
    pub body: String,
    pub kind: String,
    pub timestamp: String,
}

impl From<StoredMessage> for MessageResponse {
    fn from(message: StoredMessage) -> Self {
        Self {
            from: message.from_user,
            to: message.to_user,
            body: message.body,
            kind: message.kind.to_string(),
            timestamp: message.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActiveChatResponse {
    pub username: String,
    pub last_activity: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemoveChatRequest {
    pub username: String,
}

/// All messages between the caller and `username`, oldest first.
#[utoipa::path(
    get,
    path = "/api/chat-history/{username}",
    tag = "chats",
    params(("username" = String, Path, description = "The other participant")),
    responses((status = 200, description = "Messages in timestamp order", body = [MessageResponse]))
)]
pub async fn chat_history(
    State(state): State<Arc<GatewayState>>,
    caller: CallerIdentity,
    Path(username): Path<String>,
) -> GatewayResult<Json<Vec<MessageResponse>>> {
    let history = state.messages.history_for_pair(&caller.0, &username).await?;

    Ok(Json(history.into_iter().map(MessageResponse::from).collect()))
}

/// The caller's chat peers, most recently active first.
#[utoipa::path(
    get,
    path = "/api/active-chats",
    tag = "chats",
    responses((status = 200, description = "Peers by recent activity", body = [ActiveChatResponse]))
)]
pub async fn active_chats(
    State(state): State<Arc<GatewayState>>,
    caller: CallerIdentity,
) -> GatewayResult<Json<Vec<ActiveChatResponse>>> {
    let sessions = state.sessions.list_for_user(&caller.0).await?;

    Ok(Json(
        sessions
            .into_iter()
            .map(|session| ActiveChatResponse {
                username: session.peer_of(&caller.0).to_string(),
                last_activity: session.last_activity,
            })
            .collect(),
    ))
}

/// Delete the session with `username` and every message between the pair.
#[utoipa::path(
    post,
    path = "/api/remove-chat",
    tag = "chats",
    request_body = RemoveChatRequest,
    responses((status = 204, description = "Session and messages removed"))
)]
pub async fn remove_chat(
    State(state): State<Arc<GatewayState>>,
    caller: CallerIdentity,
    Json(request): Json<RemoveChatRequest>,
) -> GatewayResult<StatusCode> {
    state
        .sessions
        .remove_with_messages(&caller.0, &request.username)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
