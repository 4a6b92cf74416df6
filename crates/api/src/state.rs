use std::sync::Arc;

use crate::config::{ServerConfig, StorageConfig};
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: examark_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Booklet directory tree configuration.
    pub storage: Arc<StorageConfig>,
    /// WebSocket connection manager (evaluation clients).
    pub ws_manager: Arc<WsManager>,
    /// Centralized event bus for publishing workflow events.
    pub event_bus: Arc<examark_events::EventBus>,
}
