//! WebSocket upgrade handler for realtime connections.
//!
//! Handles the HTTP → WebSocket upgrade and runs the connection:
//! 1. Optionally require a `user_id` hint on the handshake
//! 2. Upgrade and register an outbox with the transport
//! 3. Greet with `connected`, then pump outbox frames to the socket
//! 4. Feed client frames to the connection lifecycle
//! 5. Unbind and drop the outbox on disconnect

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::application::realtime::RoomRegistry;
use crate::config::RealtimeConfig;
use crate::domain::foundation::ConnectionId;
use crate::domain::realtime::RealtimeEvent;
use crate::ports::RoomTransport;

use super::{
    lifecycle::{ConnectionLifecycle, Step},
    messages::{encode, ClientMessage, ConnectedMessage},
    transport::LocalTransport,
};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct RealtimeState {
    pub registry: Arc<RoomRegistry>,
    pub transport: Arc<LocalTransport>,
    pub config: RealtimeConfig,
}

impl RealtimeState {
    pub fn new(
        registry: Arc<RoomRegistry>,
        transport: Arc<LocalTransport>,
        config: RealtimeConfig,
    ) -> Self {
        Self {
            registry,
            transport,
            config,
        }
    }
}

/// Query parameters accepted on the handshake.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Identity hint. Never binds the connection; `join_user_room` does.
    pub user_id: Option<String>,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET {realtime.ws_path}`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<RealtimeState>,
) -> Response {
    let has_hint = params.user_id.as_deref().is_some_and(|id| !id.trim().is_empty());
    if state.config.require_connect_identity && !has_hint {
        tracing::warn!("Rejected WebSocket handshake without user_id");
        return (StatusCode::UNAUTHORIZED, "Missing user_id").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Run one established connection until either side goes away.
async fn handle_socket(socket: WebSocket, state: RealtimeState) {
    let connection_id = ConnectionId::new();
    let outbox = state.transport.register(connection_id).await;
    let (sender, mut receiver) = socket.split();

    // The greeting goes through the outbox so it is ordered before any ack.
    let greeting = ConnectedMessage::new(connection_id).into_event();
    if let Err(e) = state.transport.send(connection_id, &greeting).await {
        tracing::debug!(connection_id = %connection_id, "Failed to queue connected message: {}", e);
    }

    let send_timeout = state.config.send_timeout();
    let mut send_task = tokio::spawn(write_outbox(connection_id, outbox, sender, send_timeout));
    let mut writer_done = false;

    let transport: Arc<dyn RoomTransport> = state.transport.clone();
    let mut lifecycle = ConnectionLifecycle::new(connection_id, state.registry.clone(), transport);

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => match ClientMessage::parse(&text) {
                    Ok(message) => {
                        if lifecycle.handle(message).await == Step::Close {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!(connection_id = %connection_id, "Ignoring malformed frame: {}", e);
                    }
                },
                Some(Ok(Message::Binary(_))) => {
                    tracing::debug!(connection_id = %connection_id, "Ignoring binary frame");
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                    // WebSocket protocol ping/pong - handled automatically by axum
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::debug!(connection_id = %connection_id, "Client closed connection");
                    break;
                }
                Some(Err(e)) => {
                    tracing::debug!(connection_id = %connection_id, "Receive error: {}", e);
                    break;
                }
            },
            _ = &mut send_task => {
                writer_done = true;
                break;
            }
        }
    }

    // Dropping the outbox sender lets the writer flush what is queued and exit.
    lifecycle.disconnect().await;
    if !writer_done && tokio::time::timeout(send_timeout, &mut send_task).await.is_err() {
        send_task.abort();
    }
}

/// Forward queued events to the socket. A write that exceeds
/// `send_timeout` ends the connection rather than stalling the queue.
async fn write_outbox(
    connection_id: ConnectionId,
    mut outbox: mpsc::Receiver<RealtimeEvent>,
    mut sender: futures::stream::SplitSink<WebSocket, Message>,
    send_timeout: Duration,
) {
    while let Some(event) = outbox.recv().await {
        let text = match encode(&event) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    event_type = %event.event_type,
                    "Dropping unencodable event: {}",
                    e
                );
                continue;
            }
        };

        match tokio::time::timeout(send_timeout, sender.send(Message::Text(text))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(connection_id = %connection_id, "Send error, closing connection: {}", e);
                return;
            }
            Err(_) => {
                tracing::warn!(connection_id = %connection_id, "Socket write timed out, closing connection");
                return;
            }
        }
    }
    let _ = sender.close().await;
}

/// Health probe body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
    pub bound_connections: usize,
    pub users: usize,
    pub channels: usize,
}

/// GET /health
pub async fn health(State(state): State<RealtimeState>) -> impl IntoResponse {
    let stats = state.registry.stats().await;
    Json(HealthResponse {
        status: "ok",
        connections: state.transport.connection_count().await,
        bound_connections: stats.connections,
        users: stats.users,
        channels: stats.channels,
    })
}

/// Create axum router for the WebSocket endpoint and health probe.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .merge(realtime_router(&config.realtime))
///     .with_state(realtime_state);
/// ```
pub fn realtime_router(config: &RealtimeConfig) -> axum::Router<RealtimeState> {
    use axum::routing::get;

    axum::Router::new()
        .route(&config.ws_path, get(ws_handler))
        .route("/health", get(health))
}
