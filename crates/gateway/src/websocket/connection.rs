//! Per-connection WebSocket task
//!
//! Each accepted socket runs independently: a sender task drains the
//! connection's outbound channel while the read loop processes client events
//! in arrival order (FIFO per connection; no ordering across connections).

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use vicinity_presence::ConnectionId;

use crate::events::{ClientEvent, ServerEvent};
use crate::state::GatewayState;
use crate::websocket::handlers;

/// Buffered events per connection before deliveries start getting dropped.
const OUTBOUND_BUFFER: usize = 64;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<GatewayState>) {
    let (mut ws_sender, mut receiver) = socket.split();
    let connection = ConnectionId::next();

    let (out_tx, mut out_rx) = mpsc::channel::<ServerEvent>(OUTBOUND_BUFFER);
    let sender_task = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(error) => {
                    warn!(%error, "failed to serialize server event");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    debug!(%connection, "websocket connection opened");

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    if let Err(error) =
                        handlers::handle_client_event(event, connection, &out_tx, &state).await
                    {
                        debug!(%connection, %error, "client event failed");
                        let _ = out_tx
                            .send(ServerEvent::Error {
                                message: error.to_string(),
                            })
                            .await;
                    }
                }
                Err(error) => {
                    warn!(%connection, %error, "unparseable client event");
                    let _ = out_tx
                        .send(ServerEvent::Error {
                            message: "invalid event format".to_string(),
                        })
                        .await;
                }
            },
            Ok(Message::Close(_)) => break,
            Err(error) => {
                debug!(%connection, %error, "websocket transport error");
                break;
            }
            // Ping, pong, and binary frames carry no client events.
            _ => {}
        }
    }

    // Runs on every exit path, transport errors included, so the identity's
    // other sessions keep receiving deliveries.
    state.presence.unbind(connection).await;
    sender_task.abort();
    debug!(%connection, "websocket connection closed");
}
