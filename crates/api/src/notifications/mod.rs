//! Event-to-WebSocket forwarding.
//!
//! [`NotificationForwarder`] subscribes to the workflow event bus and
//! pushes each event to WebSocket clients: subject-scoped classification
//! events go to their `classification:<code>` topic, everything else is
//! broadcast to all connected clients.

use std::sync::Arc;

use axum::extract::ws::Message;
use examark_events::WorkflowEvent;
use tokio::sync::broadcast;

use crate::ws::{classification_topic, WsManager};

/// Forwards workflow events to WebSocket clients.
pub struct NotificationForwarder {
    ws_manager: Arc<WsManager>,
}

impl NotificationForwarder {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the forwarding loop.
    ///
    /// Subscribes to the event bus via `receiver` and processes each event.
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](examark_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<WorkflowEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.forward(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification forwarder lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification forwarder shutting down");
                    break;
                }
            }
        }
    }

    async fn forward(&self, event: &WorkflowEvent) {
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, event_type = %event.event_type, "Unserializable event");
                return;
            }
        };
        let message = Message::Text(text.into());

        if event.event_type.starts_with("classification.") {
            if let Some(code) = &event.subject_code {
                let topic = classification_topic(code);
                let delivered = self.ws_manager.send_to_topic(&topic, message).await;
                tracing::trace!(
                    topic = %topic,
                    delivered,
                    event_type = %event.event_type,
                    "Forwarded classification event"
                );
                return;
            }
        }

        self.ws_manager.broadcast(message).await;
    }
}
