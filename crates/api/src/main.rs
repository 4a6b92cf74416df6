use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use examark_api::background::scan_watcher;
use examark_api::config::{ServerConfig, StorageConfig};
use examark_api::notifications::NotificationForwarder;
use examark_api::router::build_app_router;
use examark_api::state::AppState;
use examark_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "examark_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let storage = StorageConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        data_root = %storage.data_root.display(),
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = examark_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    examark_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    examark_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- WebSocket manager + heartbeat ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let _heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event bus ---
    let event_bus = Arc::new(examark_events::EventBus::default());

    // Forward workflow events to WebSocket clients.
    let forwarder = NotificationForwarder::new(Arc::clone(&ws_manager));
    let _forwarder_handle = tokio::spawn(forwarder.run(event_bus.subscribe()));

    // --- Scan watcher ---
    let watcher_cancel = CancellationToken::new();
    let _watcher_handle = tokio::spawn(scan_watcher::run(
        pool.clone(),
        Arc::clone(&event_bus),
        storage.data_root.clone(),
        Duration::from_secs(storage.watch_interval_secs),
        watcher_cancel.clone(),
    ));

    tracing::info!("Background services started (heartbeat, forwarder, scan watcher)");

    // --- App state + router ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        storage: Arc::new(storage),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
    };
    let app = build_app_router(state, &config);

    // --- Serve ---
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid bind address");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(watcher_cancel, ws_manager))
        .await
        .expect("Server error");
}

/// Wait for Ctrl-C, then stop background tasks and close WebSocket
/// connections before the server drains.
async fn shutdown_signal(watcher_cancel: CancellationToken, ws_manager: Arc<ws::WsManager>) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    tracing::info!("Shutdown signal received");
    watcher_cancel.cancel();
    ws_manager.shutdown_all().await;
}
