use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use serde::Serialize;
use sitedesk_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a socket.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// One registered socket.
pub struct WsConnection {
    pub user_id: DbId,
    /// Admin sockets also receive material-request alerts.
    pub is_admin: bool,
    pub sender: WsSender,
    pub connected_at: Timestamp,
}

/// Registry of open sockets keyed by connection id.
///
/// A user may hold several connections (one per tab or device). Delivery is
/// best effort: a send that fails because the receiving half is gone evicts
/// that connection, and nothing is queued for later.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection and return the receiver to forward into the socket.
    pub async fn add(
        &self,
        conn_id: String,
        user_id: DbId,
        is_admin: bool,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            is_admin,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection. Removing an unknown or already removed id is a no-op.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Send to a single connection. Returns whether it was delivered.
    pub async fn send_to_conn(&self, conn_id: &str, message: Message) -> bool {
        let delivered = {
            let conns = self.connections.read().await;
            match conns.get(conn_id) {
                Some(conn) => conn.sender.send(message).is_ok(),
                None => return false,
            }
        };
        if !delivered {
            self.evict(vec![conn_id.to_string()]).await;
        }
        delivered
    }

    /// Send to every connection of `user_id`. Returns the number delivered.
    pub async fn send_to_user(&self, user_id: DbId, message: Message) -> usize {
        self.send_where(|conn| conn.user_id == user_id, message).await
    }

    /// Send to every connection held by an administrator.
    pub async fn send_to_admins(&self, message: Message) -> usize {
        self.send_where(|conn| conn.is_admin, message).await
    }

    /// Send to every connection.
    pub async fn broadcast(&self, message: Message) -> usize {
        self.send_where(|_| true, message).await
    }

    /// Number of open connections of one user.
    pub async fn user_connection_count(&self, user_id: DbId) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|conn| conn.user_id == user_id)
            .count()
    }

    /// Number of open connections in total.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the registry.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Ping every connection, evicting the ones that are gone.
    ///
    /// Returns the number of connections still registered.
    pub async fn ping_all(&self) -> usize {
        self.broadcast(Message::Ping(Bytes::new())).await
    }

    async fn send_where<F>(&self, matches: F, message: Message) -> usize
    where
        F: Fn(&WsConnection) -> bool,
    {
        let mut delivered = 0;
        let mut dead = Vec::new();
        {
            let conns = self.connections.read().await;
            for (id, conn) in conns.iter().filter(|(_, conn)| matches(conn)) {
                if conn.sender.send(message.clone()).is_ok() {
                    delivered += 1;
                } else {
                    dead.push(id.clone());
                }
            }
        }
        if !dead.is_empty() {
            self.evict(dead).await;
        }
        delivered
    }

    async fn evict(&self, conn_ids: Vec<String>) {
        let mut conns = self.connections.write().await;
        for id in &conn_ids {
            conns.remove(id);
        }
        tracing::debug!(count = conn_ids.len(), "Evicted closed WebSocket connections");
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize `payload` into a text frame.
pub fn json_message<T: Serialize>(payload: &T) -> Result<Message, serde_json::Error> {
    Ok(Message::Text(serde_json::to_string(payload)?.into()))
}
