//! Per-process WebSocket connection registry (spec §4.5 "maintain an
//! in-memory registry `user_id -> connection`"). Scoped to this users-svc
//! instance (spec §9 "Global state" — a multi-instance deployment needs
//! sticky routing or a presence broadcast, out of scope here).
//!
//! A multi-map: duplicate connections for the same user are all kept and
//! all receive events (spec §4.5). Guarded by a `RwLock` the way the
//! teacher guards `RateLimiterState` — reads (notify) are frequent, writes
//! (connect/disconnect) are rare.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Message;
use domain::services::{Envelope, NotificationResult, Notifier};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct WsRegistry {
    connections: Arc<RwLock<HashMap<Uuid, Vec<UnboundedSender<Message>>>>>,
}

impl WsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns its index within this user's
    /// connection list, to be handed back to `disconnect` on socket close.
    pub async fn connect(&self, user_id: Uuid, sender: UnboundedSender<Message>) -> usize {
        let mut guard = self.connections.write().await;
        let senders = guard.entry(user_id).or_default();
        senders.push(sender);
        senders.len() - 1
    }

    /// Drops a specific closed sender, identified by its inability to send
    /// (`UnboundedSender` has no direct equality, so disconnect is driven
    /// by the connection task retaining its own index rather than by
    /// identity lookup here).
    pub async fn disconnect(&self, user_id: Uuid, index: usize) {
        let mut guard = self.connections.write().await;
        if let Some(senders) = guard.get_mut(&user_id) {
            if index < senders.len() {
                senders.remove(index);
            }
            if senders.is_empty() {
                guard.remove(&user_id);
            }
        }
    }

    pub async fn connection_count(&self, user_id: Uuid) -> usize {
        self.connections
            .read()
            .await
            .get(&user_id)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl Notifier for WsRegistry {
    async fn notify(&self, user_id: Uuid, envelope: Envelope) -> NotificationResult {
        let guard = self.connections.read().await;
        let Some(senders) = guard.get(&user_id) else {
            return NotificationResult::NoConnection;
        };
        if senders.is_empty() {
            return NotificationResult::NoConnection;
        }

        let payload = match serde_json::to_string(&envelope) {
            Ok(p) => p,
            Err(err) => return NotificationResult::Failed(err.to_string()),
        };

        let mut delivered = false;
        for sender in senders {
            if sender.send(Message::Text(payload.clone())).is_ok() {
                delivered = true;
            }
        }

        if delivered {
            NotificationResult::Sent
        } else {
            NotificationResult::Failed("all connections closed".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_with_no_connection_reports_no_connection() {
        let registry = WsRegistry::new();
        let result = registry.notify(Uuid::new_v4(), Envelope::new("match.found", serde_json::json!({}))).await;
        assert_eq!(result, NotificationResult::NoConnection);
    }

    #[tokio::test]
    async fn notify_delivers_to_connected_user() {
        let registry = WsRegistry::new();
        let user_id = Uuid::new_v4();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        registry.connect(user_id, tx).await;

        let result = registry
            .notify(user_id, Envelope::new("match.found", serde_json::json!({"a": 1})))
            .await;
        assert_eq!(result, NotificationResult::Sent);
        let msg = rx.recv().await.unwrap();
        assert!(matches!(msg, Message::Text(_)));
    }

    #[tokio::test]
    async fn duplicate_connections_all_receive() {
        let registry = WsRegistry::new();
        let user_id = Uuid::new_v4();
        let (tx1, mut rx1) = tokio::sync::mpsc::unbounded_channel();
        let (tx2, mut rx2) = tokio::sync::mpsc::unbounded_channel();
        registry.connect(user_id, tx1).await;
        registry.connect(user_id, tx2).await;

        registry.notify(user_id, Envelope::new("ping", serde_json::json!({}))).await;
        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn disconnect_removes_the_connection() {
        let registry = WsRegistry::new();
        let user_id = Uuid::new_v4();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        registry.connect(user_id, tx).await;
        assert_eq!(registry.connection_count(user_id).await, 1);

        registry.disconnect(user_id, 0).await;
        assert_eq!(registry.connection_count(user_id).await, 0);
    }
}
