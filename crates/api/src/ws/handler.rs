use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use examark_db::repositories::ProgressRepo;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::state::AppState;

/// Topic a client subscribes to for the dashboard's progress feed.
pub const TOPIC_PROGRESS: &str = "progress";

/// Inbound client message: `{"action": "subscribe", "topic": "..."}`.
#[derive(Debug, Deserialize)]
struct ClientMessage {
    action: String,
    topic: String,
}

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection is registered with `WsManager` and
/// managed by two tasks (sender + receiver).
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Processes inbound subscribe/unsubscribe messages on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    // Register and get the receiver for outbound messages.
    let mut rx = state.ws_manager.add(conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: process inbound messages.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                handle_client_message(&state, &conn_id, &text).await;
            }
            Ok(_msg) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort sender task.
    state.ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Dispatch a single inbound text frame.
///
/// Subscribing to the progress topic immediately pushes the full current
/// list so a freshly connected dashboard starts from a complete snapshot.
async fn handle_client_message(state: &AppState, conn_id: &str, text: &Utf8Bytes) {
    let msg: ClientMessage = match serde_json::from_str(text.as_str()) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(conn_id = %conn_id, error = %e, "Ignoring malformed client message");
            return;
        }
    };

    match msg.action.as_str() {
        "subscribe" => {
            state.ws_manager.subscribe(conn_id, msg.topic.clone()).await;
            tracing::debug!(conn_id = %conn_id, topic = %msg.topic, "Subscribed");

            if msg.topic == TOPIC_PROGRESS {
                match ProgressRepo::list_all(&state.pool).await {
                    Ok(list) => {
                        let payload = serde_json::json!({
                            "event_type": "progress.list",
                            "payload": list,
                        });
                        state
                            .ws_manager
                            .send_to(conn_id, Message::Text(payload.to_string().into()))
                            .await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to load progress snapshot");
                    }
                }
            }
        }
        "unsubscribe" => {
            state.ws_manager.unsubscribe(conn_id, &msg.topic).await;
            tracing::debug!(conn_id = %conn_id, topic = %msg.topic, "Unsubscribed");
        }
        other => {
            tracing::debug!(conn_id = %conn_id, action = other, "Unknown client action");
        }
    }
}
