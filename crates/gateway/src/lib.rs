//! # Vicinity Gateway Crate
//!
//! HTTP REST and WebSocket surface for the Vicinity backend. The WebSocket
//! side carries the presence/handshake/relay engine: each connection runs as
//! an independent task, registers an identity with the presence registry,
//! negotiates chat sessions through the request/accept/deny handshake, and
//! exchanges messages that are persisted before being relayed to both
//! participants' open connections. The REST side carries the proximity
//! discovery contract and the chat history queries.

pub mod error;
pub mod events;
pub mod geo;
pub mod rest;
pub mod state;
pub mod websocket;

pub use error::{GatewayError, GatewayResult};
pub use events::{ClientEvent, ServerEvent};
pub use state::GatewayState;

use axum::{http::Method, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let arc_state = Arc::new(state);
    Router::new()
        .merge(rest::create_rest_routes().with_state(arc_state.clone()))
        .merge(websocket::create_websocket_routes().with_state(arc_state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers(Any),
        )
}
