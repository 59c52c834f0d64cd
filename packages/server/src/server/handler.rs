//! WebSocket connection and HTTP endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    protocol::{Protocol, negotiate, offered_protocols},
    registry::{Connection, ConnectionId},
    storage::LogEntry,
};

use super::state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let offered = offered_protocols(&headers);
    tracing::info!("Incoming protocol requests '{:?}'.", offered);

    let Some(protocol) = negotiate(offered.iter().map(String::as_str)) else {
        tracing::warn!(
            "No supported subprotocol offered by '{}'. Rejecting handshake.",
            identity
        );
        return Err(StatusCode::BAD_REQUEST);
    };

    // Echo exactly the selected subprotocol in the upgrade response.
    Ok(ws
        .protocols([protocol.as_str()])
        .on_upgrade(move |socket| handle_socket(socket, state, identity, protocol)))
}

/// Spawns a task that receives messages from the rx channel and pushes them
/// to the WebSocket sender.
///
/// This is the connection's writer side: frames queued by broadcasts from
/// other clients are drained into this client's socket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            // Send the message to this client
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    identity: String,
    protocol: Protocol,
) {
    let (sender, mut receiver) = socket.split();

    // Admit the connection before anything can be broadcast to it.
    let (tx, rx) = mpsc::unbounded_channel();
    let id = ConnectionId::new();
    state
        .registry
        .admit(Connection {
            id,
            identity: identity.clone(),
            protocol,
            outbound: tx,
        })
        .await;
    tracing::info!("Connection received. Adding client '{}'.", identity);

    // Announce the join to everyone already connected. The new client is
    // excluded; it has not observed its own join.
    state
        .broadcaster
        .broadcast_except(id, &identity, "Joined chat.")
        .await;

    let state_clone = state.clone();
    let identity_clone = identity.clone();

    // Task receiving messages from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::info!("Received: {}", text);
                    relay_chat(&state_clone, id, &identity_clone, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", identity_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // Task pushing messages from other clients to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Evict exactly once; a second teardown of the same connection must not
    // announce a second departure.
    if state.registry.evict(id).await {
        let remaining = state.registry.count().await;
        let notice = format!("Client disconnected ({}).", remaining);
        let notified = state.broadcaster.broadcast_except(id, &identity, &notice).await;
        tracing::info!(
            "Client '{}' disconnected, notified {} of {} remaining clients",
            identity,
            notified,
            remaining
        );
    }
}

/// Relay one inbound chat message: fan out to every other client, then hand
/// the entry to the message log on a detached task.
///
/// The append result is observed only for logging; a persistence failure
/// loses the entry but never affects delivery or the returned count.
async fn relay_chat(
    state: &Arc<AppState>,
    sender_id: ConnectionId,
    identity: &str,
    payload: &str,
) -> usize {
    let recipients = state
        .broadcaster
        .broadcast_except(sender_id, identity, payload)
        .await;
    let total = state.registry.count().await;
    tracing::info!("Broadcasted data to {} ({}) clients.", recipients, total);

    let entry = LogEntry {
        timestamp: state.clock.now_utc(),
        nickname: identity.to_string(),
        message: payload.to_string(),
    };
    let log = state.log.clone();
    tokio::spawn(async move {
        if let Err(e) = log.append(entry).await {
            tracing::warn!("Failed to save message to log: {}", e);
        }
    });

    recipients
}

/// Full message history as a JSON array, oldest first.
pub async fn message_log(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LogEntry>>, StatusCode> {
    match state.log.list_all().await {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => {
            tracing::error!("Failed to read message log: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
