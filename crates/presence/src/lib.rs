//! Vicinity Presence Crate
//!
//! In-memory registry binding logical identities to their live connections.
//! An identity owns a delivery group: the set of outbound channels for every
//! connection currently registered under that name. The registry is process
//! state only; it is rebuilt from registration events and never persisted.
//!
//! Delivery is fire-and-forget. Sending to an identity with no bound
//! connection is a successful no-op, and a connection whose channel is full
//! or closed is skipped rather than retried.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Process-unique handle for one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate the next connection id.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

struct Groups<E> {
    by_identity: HashMap<String, HashMap<ConnectionId, mpsc::Sender<E>>>,
    by_connection: HashMap<ConnectionId, String>,
}

impl<E> Default for Groups<E> {
    fn default() -> Self {
        Self {
            by_identity: HashMap::new(),
            by_connection: HashMap::new(),
        }
    }
}

/// Identity → delivery-group registry, safe for concurrent use from
/// arbitrary connection tasks. Generic over the event type so the registry
/// stays independent of any one wire protocol.
pub struct PresenceRegistry<E> {
    groups: Arc<RwLock<Groups<E>>>,
}

impl<E> Clone for PresenceRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            groups: Arc::clone(&self.groups),
        }
    }
}

impl<E> Default for PresenceRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> PresenceRegistry<E> {
    pub fn new() -> Self {
        Self {
            groups: Arc::new(RwLock::new(Groups::default())),
        }
    }

    /// Bind `connection`'s outbound channel into `identity`'s delivery group.
    ///
    /// Multiple connections may share one identity. Re-binding an already
    /// bound connection moves only that connection; other members of its old
    /// group are untouched.
    pub async fn bind(&self, connection: ConnectionId, identity: &str, sender: mpsc::Sender<E>) {
        let mut groups = self.groups.write().await;

        if let Some(previous) = groups.by_connection.insert(connection, identity.to_string()) {
            remove_binding(&mut groups.by_identity, &previous, connection);
        }

        groups
            .by_identity
            .entry(identity.to_string())
            .or_default()
            .insert(connection, sender);

        debug!(%connection, identity, "bound connection to delivery group");
    }

    /// Remove `connection`'s binding, leaving the identity's other sessions
    /// intact. Safe to call for a connection that never bound.
    pub async fn unbind(&self, connection: ConnectionId) {
        let mut groups = self.groups.write().await;

        if let Some(identity) = groups.by_connection.remove(&connection) {
            remove_binding(&mut groups.by_identity, &identity, connection);
            debug!(%connection, identity, "unbound connection");
        }
    }

    /// The identity `connection` is currently bound to, if any.
    pub async fn identity_of(&self, connection: ConnectionId) -> Option<String> {
        self.groups
            .read()
            .await
            .by_connection
            .get(&connection)
            .cloned()
    }

    /// Number of connections currently bound to `identity`.
    pub async fn group_size(&self, identity: &str) -> usize {
        self.groups
            .read()
            .await
            .by_identity
            .get(identity)
            .map_or(0, HashMap::len)
    }
}

impl<E: Clone> PresenceRegistry<E> {
    /// Send `event` to every connection bound to `identity`. Returns the
    /// number of connections reached; zero means the identity is offline,
    /// which is not an error.
    pub async fn deliver(&self, identity: &str, event: E) -> usize {
        let groups = self.groups.read().await;

        let Some(group) = groups.by_identity.get(identity) else {
            return 0;
        };

        let mut reached = 0;
        for sender in group.values() {
            if sender.try_send(event.clone()).is_ok() {
                reached += 1;
            }
        }
        reached
    }
}

fn remove_binding<E>(
    by_identity: &mut HashMap<String, HashMap<ConnectionId, mpsc::Sender<E>>>,
    identity: &str,
    connection: ConnectionId,
) {
    if let Some(group) = by_identity.get_mut(identity) {
        group.remove(&connection);
        // Drop empty groups so churned identities do not accumulate.
        if group.is_empty() {
            by_identity.remove(identity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> (ConnectionId, mpsc::Sender<u32>, mpsc::Receiver<u32>) {
        let (tx, rx) = mpsc::channel(8);
        (ConnectionId::next(), tx, rx)
    }

    #[tokio::test]
    async fn delivers_to_every_session_of_an_identity() {
        let registry = PresenceRegistry::new();
        let (conn_a, tx_a, mut rx_a) = connection();
        let (conn_b, tx_b, mut rx_b) = connection();

        registry.bind(conn_a, "alice", tx_a).await;
        registry.bind(conn_b, "alice", tx_b).await;

        let reached = registry.deliver("alice", 7).await;
        assert_eq!(reached, 2);
        assert_eq!(rx_a.recv().await, Some(7));
        assert_eq!(rx_b.recv().await, Some(7));
    }

    #[tokio::test]
    async fn offline_identity_is_a_silent_noop() {
        let registry: PresenceRegistry<u32> = PresenceRegistry::new();
        assert_eq!(registry.deliver("nobody", 1).await, 0);
    }

    #[tokio::test]
    async fn unbind_leaves_other_sessions_intact() {
        let registry = PresenceRegistry::new();
        let (conn_a, tx_a, mut rx_a) = connection();
        let (conn_b, tx_b, _rx_b) = connection();

        registry.bind(conn_a, "alice", tx_a).await;
        registry.bind(conn_b, "alice", tx_b).await;
        registry.unbind(conn_b).await;

        assert_eq!(registry.group_size("alice").await, 1);
        assert_eq!(registry.deliver("alice", 3).await, 1);
        assert_eq!(rx_a.recv().await, Some(3));
        assert!(registry.identity_of(conn_b).await.is_none());
    }

    #[tokio::test]
    async fn rebind_moves_only_the_rebinding_connection() {
        let registry = PresenceRegistry::new();
        let (conn_a, tx_a, _rx_a) = connection();
        let (conn_b, tx_b, mut rx_b) = connection();

        registry.bind(conn_a, "alice", tx_a.clone()).await;
        registry.bind(conn_b, "alice", tx_b).await;

        registry.bind(conn_a, "bob", tx_a).await;

        assert_eq!(registry.identity_of(conn_a).await.as_deref(), Some("bob"));
        assert_eq!(registry.group_size("alice").await, 1);
        assert_eq!(registry.deliver("alice", 9).await, 1);
        assert_eq!(rx_b.recv().await, Some(9));
    }

    #[tokio::test]
    async fn closed_receiver_is_skipped_not_an_error() {
        let registry = PresenceRegistry::new();
        let (conn_a, tx_a, rx_a) = connection();

        registry.bind(conn_a, "alice", tx_a).await;
        drop(rx_a);

        assert_eq!(registry.deliver("alice", 1).await, 0);
    }
}
