//! Direct tests of the WebSocket registry: no HTTP upgrade involved.

use axum::extract::ws::Message;
use sitedesk_api::ws::WsManager;

fn text(s: &str) -> Message {
    Message::Text(s.into())
}

fn text_of(message: Option<Message>) -> String {
    match message {
        Some(Message::Text(t)) => t.as_str().to_string(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_and_remove_track_counts() {
    let manager = WsManager::new();
    assert_eq!(manager.connection_count().await, 0);

    let _a = manager.add("conn-a".into(), 1, false).await;
    let _b = manager.add("conn-b".into(), 1, false).await;
    let _c = manager.add("conn-c".into(), 2, true).await;
    assert_eq!(manager.connection_count().await, 3);
    assert_eq!(manager.user_connection_count(1).await, 2);

    manager.remove("conn-a").await;
    assert_eq!(manager.user_connection_count(1).await, 1);

    // Removing twice, or an unknown id, changes nothing.
    manager.remove("conn-a").await;
    manager.remove("nonexistent").await;
    assert_eq!(manager.connection_count().await, 2);
}

// ---------------------------------------------------------------------------
// Targeted delivery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_to_user_reaches_every_connection_of_that_user() {
    let manager = WsManager::new();
    let mut first = manager.add("c1".into(), 7, false).await;
    let mut second = manager.add("c2".into(), 7, false).await;
    let mut other = manager.add("c3".into(), 8, false).await;

    let delivered = manager.send_to_user(7, text("hello")).await;

    assert_eq!(delivered, 2);
    assert_eq!(text_of(first.recv().await), "hello");
    assert_eq!(text_of(second.recv().await), "hello");
    assert!(other.try_recv().is_err());
}

#[tokio::test]
async fn send_to_admins_skips_regular_users() {
    let manager = WsManager::new();
    let mut admin = manager.add("admin".into(), 1, true).await;
    let mut worker = manager.add("worker".into(), 2, false).await;

    assert_eq!(manager.send_to_admins(text("restock")).await, 1);
    assert_eq!(text_of(admin.recv().await), "restock");
    assert!(worker.try_recv().is_err());
}

#[tokio::test]
async fn send_to_conn_reports_delivery() {
    let manager = WsManager::new();
    let mut rx = manager.add("only".into(), 1, false).await;

    assert!(manager.send_to_conn("only", text("direct")).await);
    assert!(!manager.send_to_conn("missing", text("direct")).await);
    assert_eq!(text_of(rx.recv().await), "direct");
}

// ---------------------------------------------------------------------------
// Broadcast and eviction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_evicts_closed_receivers() {
    let manager = WsManager::new();
    let mut alive = manager.add("alive".into(), 1, false).await;
    let dropped = manager.add("dropped".into(), 2, false).await;
    drop(dropped);

    let delivered = manager.broadcast(text("all")).await;

    assert_eq!(delivered, 1);
    assert_eq!(manager.connection_count().await, 1);
    assert_eq!(text_of(alive.recv().await), "all");
}

#[tokio::test]
async fn ping_all_counts_live_connections() {
    let manager = WsManager::new();
    let mut rx = manager.add("c1".into(), 1, false).await;
    let gone = manager.add("c2".into(), 1, false).await;
    drop(gone);

    assert_eq!(manager.ping_all().await, 1);
    assert!(matches!(rx.recv().await, Some(Message::Ping(_))));
}

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_sends_close_and_clears_registry() {
    let manager = WsManager::new();
    let mut first = manager.add("c1".into(), 1, false).await;
    let mut second = manager.add("c2".into(), 2, true).await;

    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);
    assert!(matches!(first.recv().await, Some(Message::Close(None))));
    assert!(matches!(second.recv().await, Some(Message::Close(None))));
    // Senders were dropped with the registry.
    assert!(first.recv().await.is_none());
}
