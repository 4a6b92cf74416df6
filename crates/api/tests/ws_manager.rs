//! Unit tests for `WsManager`.
//!
//! These tests exercise the WebSocket connection manager directly, without
//! performing any HTTP upgrades. They verify add/remove semantics, topic
//! subscriptions, broadcast delivery, and graceful shutdown behaviour.

use axum::extract::ws::Message;
use examark_api::ws::{classification_topic, WsManager};

// ---------------------------------------------------------------------------
// Test: add/remove connection bookkeeping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_manager_has_zero_connections() {
    let manager = WsManager::new();

    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();

    let _rx = manager.add("conn-1".to_string()).await;
    assert_eq!(manager.connection_count().await, 1);

    manager.remove("conn-1").await;
    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn remove_unknown_id_is_noop() {
    let manager = WsManager::new();

    let _rx = manager.add("conn-1".to_string()).await;
    manager.remove("nonexistent").await;

    assert_eq!(manager.connection_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: topic subscriptions scope send_to_topic
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_to_topic_reaches_only_subscribers() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;

    let topic = classification_topic("MTH101");
    manager.subscribe("conn-1", topic.clone()).await;

    let delivered = manager
        .send_to_topic(&topic, Message::Text("scan update".into()))
        .await;
    assert_eq!(delivered, 1);

    let msg = rx1.recv().await.expect("subscriber should receive");
    assert!(matches!(&msg, Message::Text(t) if *t == "scan update"));
    assert!(
        rx2.try_recv().is_err(),
        "non-subscriber must not receive topic messages"
    );
}

#[tokio::test]
async fn unsubscribe_stops_topic_delivery() {
    let manager = WsManager::new();

    let mut rx = manager.add("conn-1".to_string()).await;
    manager.subscribe("conn-1", "progress").await;
    manager.unsubscribe("conn-1", "progress").await;

    let delivered = manager
        .send_to_topic("progress", Message::Text("rows".into()))
        .await;
    assert_eq!(delivered, 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn subscribe_unknown_connection_is_noop() {
    let manager = WsManager::new();

    manager.subscribe("ghost", "progress").await;

    let delivered = manager
        .send_to_topic("progress", Message::Text("rows".into()))
        .await;
    assert_eq!(delivered, 0);
}

// ---------------------------------------------------------------------------
// Test: broadcast() sends to everyone regardless of topics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_sends_to_all_connections() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;
    manager.subscribe("conn-1", "progress").await;

    manager.broadcast(Message::Text("hello everyone".into())).await;

    let msg1 = rx1.recv().await.expect("rx1 should receive broadcast");
    let msg2 = rx2.recv().await.expect("rx2 should receive broadcast");
    assert!(matches!(&msg1, Message::Text(t) if *t == "hello everyone"));
    assert!(matches!(&msg2, Message::Text(t) if *t == "hello everyone"));
}

#[tokio::test]
async fn broadcast_skips_closed_channels() {
    let manager = WsManager::new();

    let rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;

    // Drop rx1 to close its channel.
    drop(rx1);

    // Broadcast should not panic even though conn-1's channel is closed.
    manager.broadcast(Message::Text("still alive".into())).await;

    let msg = rx2.recv().await.expect("rx2 should receive broadcast");
    assert!(matches!(&msg, Message::Text(t) if *t == "still alive"));
}

// ---------------------------------------------------------------------------
// Test: ping_sweep() keeps live connections and drops dead ones
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ping_sweep_prunes_dead_connections() {
    let manager = WsManager::new();

    let rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;

    // Drop rx1 to close its channel; the sweep should evict it.
    drop(rx1);

    let pruned = manager.ping_sweep().await;
    assert_eq!(pruned, 1);
    assert_eq!(manager.connection_count().await, 1);

    let msg = rx2.recv().await.expect("live connection should be pinged");
    assert!(matches!(msg, Message::Ping(_)));

    // A second sweep finds nothing left to prune.
    assert_eq!(manager.ping_sweep().await, 0);
}

// ---------------------------------------------------------------------------
// Test: shutdown_all() sends Close and clears all connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.shutdown_all().await;
    assert_eq!(manager.connection_count().await, 0);

    let msg1 = rx1.recv().await.expect("rx1 should receive Close");
    assert!(matches!(msg1, Message::Close(None)));
    let msg2 = rx2.recv().await.expect("rx2 should receive Close");
    assert!(matches!(msg2, Message::Close(None)));

    // After Close, the channel should be closed (no more messages).
    assert!(rx1.recv().await.is_none());
}

// ---------------------------------------------------------------------------
// Test: adding with duplicate ID replaces the previous connection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_id_replaces_previous_connection() {
    let manager = WsManager::new();

    let _rx_old = manager.add("conn-1".to_string()).await;
    assert_eq!(manager.connection_count().await, 1);

    // Re-add with the same ID -- should replace, not duplicate.
    let mut rx_new = manager.add("conn-1".to_string()).await;
    assert_eq!(manager.connection_count().await, 1);

    manager.broadcast(Message::Text("replaced".into())).await;
    let msg = rx_new.recv().await.expect("new rx should receive message");
    assert!(matches!(&msg, Message::Text(t) if *t == "replaced"));
}
