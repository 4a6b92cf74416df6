//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`WorkflowEvent`]s. It is
//! shared via `Arc<EventBus>` across the application: the scan watcher,
//! classifier, and handlers publish; the notification forwarder subscribes
//! and fans events out to WebSocket clients.

use chrono::{DateTime, Utc};
use examark_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// WorkflowEvent
// ---------------------------------------------------------------------------

/// A domain event in the evaluation workflow.
///
/// Constructed via [`WorkflowEvent::new`] and enriched with the builder
/// methods [`with_subject`](WorkflowEvent::with_subject),
/// [`with_entity`](WorkflowEvent::with_entity), and
/// [`with_payload`](WorkflowEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    /// Dot-separated event name, e.g. `"progress.updated"` or
    /// `"classification.finished"`.
    pub event_type: String,

    /// Subject code the event belongs to, when subject-scoped.
    pub subject_code: Option<String>,

    /// Database id of the entity the event is about, when applicable.
    pub entity_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl WorkflowEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            subject_code: None,
            entity_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Scope the event to a subject.
    pub fn with_subject(mut self, subject_code: impl Into<String>) -> Self {
        self.subject_code = Some(subject_code.into());
        self
    }

    /// Attach the entity the event is about.
    pub fn with_entity(mut self, entity_id: DbId) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`WorkflowEvent`].
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: WorkflowEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
