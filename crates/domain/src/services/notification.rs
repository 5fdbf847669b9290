//! WebSocket fan-out abstraction (spec §4.5 "WebSocket edge").
//!
//! Generalized from the teacher's `NotificationService`/`MockNotificationService`
//! trait-with-mock shape: the registry that actually owns connections lives in
//! users-svc (it needs `axum::extract::ws::Message`, which this crate does not
//! depend on), so this trait is the seam users-svc's consumers push bus events
//! through, keeping the event-to-envelope mapping testable without a live socket.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The envelope every server-pushed WebSocket message uses (spec §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    pub data: serde_json::Value,
}

impl Envelope {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            event: "error".to_string(),
            data: serde_json::json!({ "code": code, "message": message }),
        }
    }
}

/// Result of a fan-out attempt to a single user's connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    /// Delivered to at least one open connection.
    Sent,
    /// The user has no open connection right now; the event is dropped
    /// (spec does not require offline queuing for WebSocket push).
    NoConnection,
    Failed(String),
}

/// Seam between bus consumers and the per-process WebSocket registry.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: Uuid, envelope: Envelope) -> NotificationResult;
}

/// Logs instead of delivering; used in tests and wherever no registry is wired.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    pub simulate_failure: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, user_id: Uuid, envelope: Envelope) -> NotificationResult {
        if self.simulate_failure {
            tracing::warn!(%user_id, event = %envelope.event, "mock notifier simulating failure");
            return NotificationResult::Failed("simulated failure".to_string());
        }
        tracing::info!(%user_id, event = %envelope.event, "mock: would push envelope over websocket");
        NotificationResult::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_notifier_sends_by_default() {
        let notifier = MockNotifier::new();
        let result = notifier
            .notify(Uuid::new_v4(), Envelope::new("match.found", serde_json::json!({})))
            .await;
        assert_eq!(result, NotificationResult::Sent);
    }

    #[test]
    fn error_envelope_carries_code_and_message() {
        let e = Envelope::error("security", "access denied");
        assert_eq!(e.event, "error");
        assert_eq!(e.data["code"], "security");
    }
}
