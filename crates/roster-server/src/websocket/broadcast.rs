//! Presence snapshot fan-out to connected clients.

use std::sync::Arc;

use tracing::{debug, warn};

use roster_core::ServerMessage;

use super::registry::PresenceRegistry;

/// Broadcasts the full presence snapshot to every live connection.
///
/// Read-only over the registry: the broadcaster never mutates it. The
/// snapshot is serialized once and the identical payload is enqueued on
/// every connection; a failed enqueue is logged and the loop continues —
/// the failing connection surfaces through its own close/error path.
pub struct PresenceBroadcaster {
    registry: Arc<PresenceRegistry>,
}

impl PresenceBroadcaster {
    /// Create a broadcaster over the given registry.
    pub fn new(registry: Arc<PresenceRegistry>) -> Self {
        Self { registry }
    }

    /// Send the current snapshot to every registered connection.
    ///
    /// A serialization failure aborts only this broadcast cycle.
    pub async fn broadcast_snapshot(&self) {
        let users = self.registry.snapshot().await;
        let online = users.len();
        let message = ServerMessage::snapshot(users);
        let json = match serde_json::to_string(&message) {
            Ok(j) => Arc::new(j),
            Err(e) => {
                warn!(error = %e, "failed to serialize presence snapshot");
                return;
            }
        };

        // Copy-then-iterate: a connection closing mid-broadcast cannot
        // mutate the collection being walked.
        let connections = self.registry.connections().await;
        debug!(online, recipients = connections.len(), "broadcast presence snapshot");
        for conn in connections {
            if !conn.send(json.clone()) {
                warn!(
                    user_id = conn.user_id(),
                    conn_id = %conn.conn_id,
                    "failed to enqueue presence update"
                );
            }
        }
    }

    /// The registry this broadcaster reads from.
    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use roster_core::Identity;

    use crate::websocket::connection::PresenceConnection;

    fn identity(id: i64, first: &str) -> Identity {
        Identity {
            id,
            first_name: first.into(),
            last_name: "Test".into(),
            email: format!("{first}@example.com").to_lowercase(),
            avatar_src: None,
        }
    }

    fn make_connection(
        id: i64,
        first: &str,
    ) -> (Arc<PresenceConnection>, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(32);
        (Arc::new(PresenceConnection::new(identity(id, first), tx)), rx)
    }

    fn payload_ids(raw: &str) -> Vec<i64> {
        let parsed: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed["type"], "SET_USERS_FROM_SERVER");
        parsed["payload"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn single_connection_receives_own_snapshot() {
        let registry = Arc::new(PresenceRegistry::new());
        let broadcaster = PresenceBroadcaster::new(registry.clone());
        let (conn, mut rx) = make_connection(1, "Ada");
        let _ = registry.register(conn).await;

        broadcaster.broadcast_snapshot().await;

        let msg = rx.recv().await.unwrap();
        assert_eq!(payload_ids(&msg), vec![1]);
    }

    #[tokio::test]
    async fn all_connections_receive_identical_payload() {
        let registry = Arc::new(PresenceRegistry::new());
        let broadcaster = PresenceBroadcaster::new(registry.clone());
        let (c1, mut rx1) = make_connection(1, "Ada");
        let (c2, mut rx2) = make_connection(2, "Grace");
        let _ = registry.register(c1).await;
        let _ = registry.register(c2).await;

        broadcaster.broadcast_snapshot().await;

        let m1 = rx1.recv().await.unwrap();
        let m2 = rx2.recv().await.unwrap();
        assert_eq!(&*m1, &*m2);
        assert_eq!(payload_ids(&m1), vec![1, 2]);
    }

    #[tokio::test]
    async fn broadcast_to_empty_registry_does_not_panic() {
        let registry = Arc::new(PresenceRegistry::new());
        let broadcaster = PresenceBroadcaster::new(registry);
        broadcaster.broadcast_snapshot().await;
    }

    #[tokio::test]
    async fn dead_connection_does_not_abort_broadcast() {
        let registry = Arc::new(PresenceRegistry::new());
        let broadcaster = PresenceBroadcaster::new(registry.clone());
        let (dead, dead_rx) = make_connection(1, "Ada");
        let (live, mut live_rx) = make_connection(2, "Grace");
        drop(dead_rx);
        let _ = registry.register(dead.clone()).await;
        let _ = registry.register(live).await;

        broadcaster.broadcast_snapshot().await;

        // The live connection still gets the full snapshot.
        let msg = live_rx.recv().await.unwrap();
        assert_eq!(payload_ids(&msg), vec![1, 2]);
        assert_eq!(dead.drop_count(), 1);
    }

    #[tokio::test]
    async fn snapshot_reflects_post_mutation_state() {
        let registry = Arc::new(PresenceRegistry::new());
        let broadcaster = PresenceBroadcaster::new(registry.clone());
        let (c1, mut rx1) = make_connection(1, "Ada");
        let (c2, _rx2) = make_connection(2, "Grace");
        let _ = registry.register(c1).await;
        let _ = registry.register(c2.clone()).await;

        assert!(registry.unregister(2, c2.conn_id).await);
        broadcaster.broadcast_snapshot().await;

        let msg = rx1.recv().await.unwrap();
        assert_eq!(payload_ids(&msg), vec![1]);
    }
}
