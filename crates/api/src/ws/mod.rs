//! WebSocket infrastructure for real-time communication.
//!
//! Provides connection management with topic subscriptions, a keep-alive
//! sweep, and the HTTP upgrade handler used by Axum routes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

mod handler;
pub mod manager;

pub use handler::{ws_handler, TOPIC_PROGRESS};
pub use manager::WsManager;

/// How often connected dashboards are pinged.
const PING_PERIOD: Duration = Duration::from_secs(30);

/// Topic carrying per-file progress of a subject's classification run.
pub fn classification_topic(subject_code: &str) -> String {
    format!("classification:{subject_code}")
}

/// Spawn the keep-alive loop: ping every dashboard on a fixed period and
/// prune connections whose channels have closed.
pub fn start_heartbeat(manager: Arc<WsManager>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PING_PERIOD);
        loop {
            ticker.tick().await;
            let pruned = manager.ping_sweep().await;
            if pruned > 0 {
                tracing::debug!(pruned, "Pruned dead WebSocket connections");
            }
        }
    })
}
