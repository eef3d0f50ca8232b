//! WebSocket handler for Axum
//!
//! Handles WebSocket upgrades, optional token authentication and the
//! per-socket read/write loops that feed the relay engine.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
};
use futures::{stream::StreamExt, SinkExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::auth::AuthIdentity;
use crate::state::AppState;

use super::{
    connection::Session,
    events::{ClientEvent, ServerEvent},
    relay::RelayEngine,
};

#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    token: Option<String>,
}

/// WebSocket handler - upgrades HTTP connection to WebSocket
/// Authenticates via query parameter token; anonymous sockets are allowed
/// unless `AUTH_REQUIRED` is set
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
    Query(params): Query<WebSocketQuery>,
) -> Result<Response, StatusCode> {
    let identity = match params.token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => match AuthIdentity::from_token(&app_state.jwt, token) {
            Ok(identity) => Some(identity),
            Err(_) => {
                tracing::warn!("WebSocket auth failed: invalid token");
                return Err(StatusCode::UNAUTHORIZED);
            }
        },
        None if app_state.config.auth_required => {
            tracing::warn!("WebSocket auth failed: token required");
            return Err(StatusCode::UNAUTHORIZED);
        }
        None => None,
    };

    tracing::info!(
        party_id = identity.as_ref().map(|i| i.party_id.as_str()).unwrap_or("anonymous"),
        "WebSocket connection upgrade requested"
    );

    let relay = app_state.relay.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, identity, relay)))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, identity: Option<AuthIdentity>, relay: RelayEngine) {
    let (mut sender, mut receiver) = socket.split();

    // Create channel for sending events to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let mut session = Session::new(tx, identity);
    let session_id = session.session_id;

    // Send connection acknowledgment
    session.send(ServerEvent::Connected { session_id });

    // Spawn task to send messages to client
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break; // Connection closed
                    }
                }
                Err(e) => {
                    tracing::error!(error = ?e, "Failed to serialize WebSocket event");
                }
            }
        }
    });

    // Handle incoming messages in receipt order
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "WebSocket transport error");
                break;
            }
        };

        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    let name = event.name();
                    if let Err(e) = relay.handle(&mut session, event).await {
                        tracing::warn!(
                            session_id = %session_id,
                            event = name,
                            error = %e,
                            "Dropped invalid client event"
                        );
                        session.send(ServerEvent::Error {
                            message: e.to_string(),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Failed to parse client event"
                    );
                    session.send(ServerEvent::Error {
                        message: "Invalid event format".to_string(),
                    });
                }
            },
            Message::Close(_) => {
                tracing::info!(session_id = %session_id, "WebSocket close frame received");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                // Axum handles ping/pong automatically
            }
            Message::Binary(_) => {
                tracing::debug!(session_id = %session_id, "Ignoring binary frame");
            }
        }
    }

    // Cleanup on disconnect
    tracing::info!(session_id = %session_id, "WebSocket connection closing");
    relay.disconnect(&mut session).await;

    send_task.abort();
}
