//! In-memory registry of connected identities.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use roster_core::{Identity, UserId};

use super::connection::PresenceConnection;

/// Mapping from user id to live connection handle.
///
/// At most one live entry per user id: a reconnecting user replaces their
/// prior entry and [`register`](Self::register) hands the replaced handle
/// back so the caller can close it. Insertion order is preserved, so
/// snapshots list users in the order they first came online.
///
/// The registry is an injected component owned by the server, never a
/// module-level singleton, so tests can run isolated instances.
pub struct PresenceRegistry {
    connections: RwLock<IndexMap<UserId, Arc<PresenceConnection>>>,
}

impl PresenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(IndexMap::new()),
        }
    }

    /// Insert a connection, replacing any prior entry for the same user.
    ///
    /// Returns the replaced handle, if any. The caller is responsible for
    /// closing it; the registry itself never touches sockets.
    pub async fn register(
        &self,
        connection: Arc<PresenceConnection>,
    ) -> Option<Arc<PresenceConnection>> {
        let mut conns = self.connections.write().await;
        conns.insert(connection.user_id(), connection)
    }

    /// Remove the entry for `user_id`, but only if it still refers to
    /// `conn_id`.
    ///
    /// Returns `true` if an entry was removed. Calling this for an already
    /// absent user, or with the connection id of a handle that has since
    /// been replaced, is a no-op — duplicate close/error events must not
    /// evict a newer connection.
    pub async fn unregister(&self, user_id: UserId, conn_id: Uuid) -> bool {
        let mut conns = self.connections.write().await;
        let is_current = conns
            .get(&user_id)
            .is_some_and(|current| current.conn_id == conn_id);
        if is_current {
            // shift_remove keeps the insertion order of the remainder.
            let _ = conns.shift_remove(&user_id);
        }
        is_current
    }

    /// Ordered list of all identities currently registered.
    ///
    /// Recomputed fresh on every call; never cached or diffed.
    pub async fn snapshot(&self) -> Vec<Identity> {
        let conns = self.connections.read().await;
        conns.values().map(|c| c.identity.clone()).collect()
    }

    /// Point-in-time copy of all connection handles.
    ///
    /// Broadcast iterates over this copy, so a connection closing
    /// mid-broadcast cannot mutate the collection being walked.
    pub async fn connections(&self) -> Vec<Arc<PresenceConnection>> {
        let conns = self.connections.read().await;
        conns.values().cloned().collect()
    }

    /// Number of registered connections.
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn identity(id: i64, first: &str) -> Identity {
        Identity {
            id,
            first_name: first.into(),
            last_name: "Test".into(),
            email: format!("{first}@example.com").to_lowercase(),
            avatar_src: None,
        }
    }

    fn make_connection(id: i64, first: &str) -> Arc<PresenceConnection> {
        let (tx, _rx) = mpsc::channel(32);
        // Receiver dropped; registry tests never send.
        Arc::new(PresenceConnection::new(identity(id, first), tx))
    }

    #[tokio::test]
    async fn register_and_count() {
        let reg = PresenceRegistry::new();
        assert_eq!(reg.count().await, 0);
        assert!(reg.register(make_connection(1, "Ada")).await.is_none());
        assert_eq!(reg.count().await, 1);
    }

    #[tokio::test]
    async fn snapshot_lists_identities_in_insertion_order() {
        let reg = PresenceRegistry::new();
        let _ = reg.register(make_connection(3, "C")).await;
        let _ = reg.register(make_connection(1, "A")).await;
        let _ = reg.register(make_connection(2, "B")).await;

        let ids: Vec<i64> = reg.snapshot().await.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn snapshot_has_no_duplicates_after_reregister() {
        let reg = PresenceRegistry::new();
        let _ = reg.register(make_connection(1, "Ada")).await;
        let _ = reg.register(make_connection(1, "Ada")).await;

        let snapshot = reg.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(reg.count().await, 1);
    }

    #[tokio::test]
    async fn register_returns_replaced_handle() {
        let reg = PresenceRegistry::new();
        let first = make_connection(1, "Ada");
        let second = make_connection(1, "Ada");

        assert!(reg.register(first.clone()).await.is_none());
        let replaced = reg.register(second.clone()).await.unwrap();
        assert_eq!(replaced.conn_id, first.conn_id);
    }

    #[tokio::test]
    async fn reregister_keeps_original_position() {
        let reg = PresenceRegistry::new();
        let _ = reg.register(make_connection(1, "A")).await;
        let _ = reg.register(make_connection(2, "B")).await;
        // User 1 reconnects; they should stay first in the snapshot.
        let _ = reg.register(make_connection(1, "A")).await;

        let ids: Vec<i64> = reg.snapshot().await.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn unregister_removes_entry() {
        let reg = PresenceRegistry::new();
        let conn = make_connection(1, "Ada");
        let _ = reg.register(conn.clone()).await;

        assert!(reg.unregister(1, conn.conn_id).await);
        assert_eq!(reg.count().await, 0);
        assert!(reg.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn unregister_absent_user_is_noop() {
        let reg = PresenceRegistry::new();
        assert!(!reg.unregister(42, Uuid::now_v7()).await);
        assert_eq!(reg.count().await, 0);
    }

    #[tokio::test]
    async fn double_unregister_is_noop() {
        let reg = PresenceRegistry::new();
        let conn = make_connection(1, "Ada");
        let _ = reg.register(conn.clone()).await;

        assert!(reg.unregister(1, conn.conn_id).await);
        assert!(!reg.unregister(1, conn.conn_id).await);
    }

    #[tokio::test]
    async fn stale_unregister_does_not_evict_replacement() {
        let reg = PresenceRegistry::new();
        let old = make_connection(1, "Ada");
        let new = make_connection(1, "Ada");
        let _ = reg.register(old.clone()).await;
        let _ = reg.register(new.clone()).await;

        // The replaced connection's close event fires late.
        assert!(!reg.unregister(1, old.conn_id).await);
        assert_eq!(reg.count().await, 1);
        assert!(reg.unregister(1, new.conn_id).await);
    }

    #[tokio::test]
    async fn unregister_preserves_remaining_order() {
        let reg = PresenceRegistry::new();
        let a = make_connection(1, "A");
        let _ = reg.register(a.clone()).await;
        let _ = reg.register(make_connection(2, "B")).await;
        let _ = reg.register(make_connection(3, "C")).await;

        assert!(reg.unregister(1, a.conn_id).await);
        let ids: Vec<i64> = reg.snapshot().await.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn connections_returns_copy() {
        let reg = PresenceRegistry::new();
        let conn = make_connection(1, "Ada");
        let _ = reg.register(conn.clone()).await;

        let copied = reg.connections().await;
        assert!(reg.unregister(1, conn.conn_id).await);
        // Copy survives the removal.
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].user_id(), 1);
    }

    #[tokio::test]
    async fn default_registry_is_empty() {
        let reg = PresenceRegistry::default();
        assert_eq!(reg.count().await, 0);
    }
}
