//! REST endpoints for the gateway
//!
//! Authentication is out of scope for this service: the external auth layer
//! fronting the gateway verifies credentials and forwards the caller's
//! identity in the `x-vicinity-user` header.

pub mod chats;
pub mod discover;
pub mod health;
pub mod location;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::GatewayError;
use crate::state::GatewayState;

/// Header carrying the authenticated caller identity.
pub const IDENTITY_HEADER: &str = "x-vicinity-user";

/// Extractor for the caller's identity as asserted by the auth layer.
pub struct CallerIdentity(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| CallerIdentity(value.to_string()))
            .ok_or_else(|| {
                GatewayError::InvalidRequest(format!("missing {} header", IDENTITY_HEADER))
            })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        discover::discover,
        location::update_location,
        chats::chat_history,
        chats::active_chats,
        chats::remove_chat,
    ),
    components(schemas(
        discover::DiscoveredPeer,
        location::UpdateLocationRequest,
        chats::MessageResponse,
        chats::ActiveChatResponse,
        chats::RemoveChatRequest,
    )),
    tags(
        (name = "discovery", description = "Proximity discovery"),
        (name = "chats", description = "Chat sessions and history"),
    )
)]
struct ApiDoc;

/// Create all REST routes
pub fn create_rest_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/discover", post(discover::discover))
        .route("/api/update-location", post(location::update_location))
        .route("/api/chat-history/:username", get(chats::chat_history))
        .route("/api/active-chats", get(chats::active_chats))
        .route("/api/remove-chat", post(chats::remove_chat))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
}
