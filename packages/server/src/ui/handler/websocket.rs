//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, header},
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use tokio::sync::mpsc;

use katagami_shared::protocol::{UserIdentity, close_code};

use crate::{
    domain::{ConnectionId, Outbound, extract_bearer_token},
    ui::state::AppState,
    usecase::{ConnectError, RelayError, RelayOutcome, run_liveness_monitor},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let token = extract_bearer_token(query.token.as_deref(), authorization);

    match state.connect_client_usecase.authenticate(token.as_deref()) {
        Ok(identity) => ws.on_upgrade(move |socket| handle_socket(socket, state, identity)),
        Err(e) => {
            tracing::warn!("Rejecting connection: {}", e);
            ws.on_upgrade(move |socket| reject_socket(socket, e))
        }
    }
}

/// Closes a freshly upgraded socket whose credential was missing or invalid.
async fn reject_socket(mut socket: WebSocket, error: ConnectError) {
    let reason = match error {
        ConnectError::MissingCredential => "Authentication required",
        _ => "Invalid token",
    };
    let frame = CloseFrame {
        code: close_code::POLICY_VIOLATION,
        reason: reason.into(),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        tracing::debug!("Failed to send policy close: {}", e);
    }
}

/// Spawns a task that drains the connection's outbound channel into the WebSocket sink.
///
/// The task ends after writing a close frame, when the sink fails, or when every
/// sender of the channel has been dropped.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let (message, last) = match outbound {
                Outbound::Text(text) => (Message::Text(text.into()), false),
                Outbound::Ping => (Message::Ping(Default::default()), false),
                Outbound::Close { code, reason } => (
                    Message::Close(Some(CloseFrame {
                        code,
                        reason: reason.into(),
                    })),
                    true,
                ),
            };
            if sender.send(message).await.is_err() || last {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: UserIdentity) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this client to receive frames
    let (tx, rx) = mpsc::unbounded_channel();

    // Register the connection, send `connected` and announce the newcomer
    let connection_id = match state.connect_client_usecase.execute(identity, tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to register connection: {}", e);
            return;
        }
    };

    let mut send_task = pusher_loop(rx, sender);

    let monitor = tokio::spawn(run_liveness_monitor(
        state.heartbeat_usecase.clone(),
        connection_id.clone(),
        state.heartbeat_interval,
    ));

    let state_clone = state.clone();
    let id_clone = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", id_clone, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    relay(&state_clone, &id_clone, text.as_str()).await;
                }
                Message::Pong(_) => {
                    state_clone.heartbeat_usecase.acknowledge(&id_clone).await;
                }
                Message::Ping(_) => {
                    // Answered by the WebSocket layer
                    tracing::trace!("Received ping from '{}'", id_clone);
                }
                Message::Binary(_) => {
                    tracing::debug!("Ignoring binary frame from '{}'", id_clone);
                }
                Message::Close(frame) => {
                    tracing::info!("Client '{}' requested close: {:?}", id_clone, frame);
                    break;
                }
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };
    monitor.abort();

    if let Err(e) = state
        .disconnect_client_usecase
        .execute(&connection_id)
        .await
    {
        tracing::warn!("Failed to disconnect '{}': {}", connection_id, e);
    }
}

async fn relay(state: &AppState, from: &ConnectionId, text: &str) {
    match state.relay_event_usecase.execute(from, text).await {
        Ok(RelayOutcome::Broadcast {
            message_type,
            recipients,
        }) => {
            tracing::debug!(
                "Relayed '{}' from '{}' to {} client(s)",
                message_type,
                from,
                recipients
            );
        }
        Ok(RelayOutcome::Replied { message_type }) => {
            tracing::trace!("Answered '{}' from '{}'", message_type, from);
        }
        Err(RelayError::Malformed(reason)) => {
            tracing::debug!("Dropping malformed message from '{}': {}", from, reason);
        }
        Err(RelayError::UnknownType(message_type)) => {
            tracing::warn!("Unknown message type '{}' from '{}'", message_type, from);
        }
        Err(e) => {
            tracing::warn!("Failed to relay message from '{}': {}", from, e);
        }
    }
}
