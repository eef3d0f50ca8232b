//! Connection registry
//!
//! Maps customer and admin ids to their single live connection. A newer join
//! for the same id supersedes the older one; an unregister only succeeds for
//! the connection that currently owns the slot.

use std::collections::HashMap;
use std::sync::Arc;

use chatrelay_shared::PartyKind;
use serde::Serialize;
use tokio::sync::RwLock;

use super::connection::Connection;
use super::events::ServerEvent;

type Slots = RwLock<HashMap<String, Arc<Connection>>>;

/// Registry of live connections, one lock per party kind
#[derive(Default)]
pub struct ConnectionRegistry {
    customers: Slots,
    admins: Slots,
}

impl ConnectionRegistry {
    /// Create an empty registry; every party starts offline
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self, kind: PartyKind) -> &Slots {
        match kind {
            PartyKind::Customer => &self.customers,
            PartyKind::Admin => &self.admins,
        }
    }

    /// Insert or overwrite the slot for the connection's party id
    ///
    /// Returns the superseded connection, if any. Its transport is left open.
    pub async fn register(&self, conn: Arc<Connection>) -> Option<Arc<Connection>> {
        let mut slots = self.slots(conn.kind).write().await;
        let previous = slots.insert(conn.party_id.clone(), Arc::clone(&conn));

        tracing::info!(
            kind = %conn.kind,
            party_id = %conn.party_id,
            connection_id = %conn.connection_id,
            superseded = previous.is_some(),
            online = slots.len(),
            "Connection registered"
        );

        previous
    }

    /// Current connection for a party id
    pub async fn lookup(&self, kind: PartyKind, party_id: &str) -> Option<Arc<Connection>> {
        let slots = self.slots(kind).read().await;
        slots.get(party_id).cloned()
    }

    /// Remove the slot only if `conn` still owns it
    ///
    /// Returns true when the slot was released. A stale connection that was
    /// superseded by a newer join gets false and leaves the registry untouched.
    pub async fn unregister(&self, conn: &Connection) -> bool {
        let mut slots = self.slots(conn.kind).write().await;
        let owns_slot = slots
            .get(&conn.party_id)
            .is_some_and(|current| current.connection_id == conn.connection_id);

        if !owns_slot {
            tracing::debug!(
                kind = %conn.kind,
                party_id = %conn.party_id,
                connection_id = %conn.connection_id,
                "Stale unregister ignored"
            );
            return false;
        }

        slots.remove(&conn.party_id);
        tracing::info!(
            kind = %conn.kind,
            party_id = %conn.party_id,
            connection_id = %conn.connection_id,
            online = slots.len(),
            "Connection unregistered"
        );
        true
    }

    /// Snapshot of every connection of one kind
    ///
    /// The lock is released before the caller iterates, so concurrent
    /// registrations never block or skip a broadcast already in progress.
    pub async fn all_of(&self, kind: PartyKind) -> Vec<Arc<Connection>> {
        let slots = self.slots(kind).read().await;
        slots.values().cloned().collect()
    }

    /// Push an event to one party; false when the party is not registered
    pub async fn send_to(&self, kind: PartyKind, party_id: &str, event: ServerEvent) -> bool {
        match self.lookup(kind, party_id).await {
            Some(conn) => conn.send(event),
            None => {
                tracing::debug!(
                    kind = %kind,
                    party_id = %party_id,
                    event = event.name(),
                    "Recipient offline - push skipped"
                );
                false
            }
        }
    }

    /// Push an event to every registered connection of one kind
    ///
    /// Returns the number of connections the event was handed to.
    pub async fn broadcast(&self, kind: PartyKind, event: ServerEvent) -> usize {
        let recipients = self.all_of(kind).await;
        let mut delivered = 0;

        for conn in &recipients {
            if conn.send(event.clone()) {
                delivered += 1;
            }
        }

        tracing::debug!(
            kind = %kind,
            event = event.name(),
            recipients = delivered,
            failed = recipients.len() - delivered,
            "Broadcast event"
        );

        delivered
    }

    /// Who is online, sorted by party id
    pub async fn online(&self, kind: PartyKind) -> Vec<PresenceEntry> {
        let mut entries: Vec<PresenceEntry> = self
            .all_of(kind)
            .await
            .into_iter()
            .map(|c| PresenceEntry {
                party_id: c.party_id.clone(),
                name: c.name.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.party_id.cmp(&b.party_id));
        entries
    }

    /// Get statistics about registered connections
    pub async fn stats(&self) -> RegistryStats {
        RegistryStats {
            customers_online: self.customers.read().await.len(),
            admins_online: self.admins.read().await.len(),
        }
    }
}

/// One online party
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    pub party_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Statistics about registered connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub customers_online: usize,
    pub admins_online: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn connection(
        kind: PartyKind,
        party_id: &str,
    ) -> (Arc<Connection>, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Arc::new(Connection::new(Uuid::new_v4(), kind, party_id, None, tx));
        (conn, rx)
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = connection(PartyKind::Customer, "c1");

        assert!(registry.register(Arc::clone(&conn)).await.is_none());

        let found = registry.lookup(PartyKind::Customer, "c1").await.unwrap();
        assert_eq!(found.connection_id, conn.connection_id);

        // Kinds are separate namespaces
        assert!(registry.lookup(PartyKind::Admin, "c1").await.is_none());
    }

    #[tokio::test]
    async fn test_last_join_wins() {
        let registry = ConnectionRegistry::new();
        let (old, _rx1) = connection(PartyKind::Customer, "c1");
        let (new, _rx2) = connection(PartyKind::Customer, "c1");

        registry.register(Arc::clone(&old)).await;
        let superseded = registry.register(Arc::clone(&new)).await.unwrap();
        assert_eq!(superseded.connection_id, old.connection_id);

        let current = registry.lookup(PartyKind::Customer, "c1").await.unwrap();
        assert_eq!(current.connection_id, new.connection_id);
    }

    #[tokio::test]
    async fn test_stale_unregister_is_noop() {
        let registry = ConnectionRegistry::new();
        let (old, _rx1) = connection(PartyKind::Customer, "c1");
        let (new, _rx2) = connection(PartyKind::Customer, "c1");

        registry.register(Arc::clone(&old)).await;
        registry.register(Arc::clone(&new)).await;

        assert!(!registry.unregister(&old).await);
        let current = registry.lookup(PartyKind::Customer, "c1").await.unwrap();
        assert_eq!(current.connection_id, new.connection_id);

        assert!(registry.unregister(&new).await);
        assert!(registry.lookup(PartyKind::Customer, "c1").await.is_none());

        // Releasing twice is harmless
        assert!(!registry.unregister(&new).await);
    }

    #[tokio::test]
    async fn test_lookup_tracks_latest_register_across_sequences() {
        let registry = ConnectionRegistry::new();
        let conns: Vec<_> = (0..4).map(|_| connection(PartyKind::Admin, "a1")).collect();

        // register 0, 1; unregister 0 (stale); register 2; unregister 2; register 3; unregister 1 (stale)
        registry.register(Arc::clone(&conns[0].0)).await;
        registry.register(Arc::clone(&conns[1].0)).await;
        registry.unregister(&conns[0].0).await;
        assert_eq!(
            registry.lookup(PartyKind::Admin, "a1").await.unwrap().connection_id,
            conns[1].0.connection_id
        );

        registry.register(Arc::clone(&conns[2].0)).await;
        registry.unregister(&conns[2].0).await;
        assert!(registry.lookup(PartyKind::Admin, "a1").await.is_none());

        registry.register(Arc::clone(&conns[3].0)).await;
        registry.unregister(&conns[1].0).await;
        assert_eq!(
            registry.lookup(PartyKind::Admin, "a1").await.unwrap().connection_id,
            conns[3].0.connection_id
        );
    }

    #[tokio::test]
    async fn test_broadcast_reaches_exactly_registered_admins() {
        for n in 0..5 {
            let registry = ConnectionRegistry::new();
            let mut receivers = Vec::new();
            for i in 0..n {
                let (conn, rx) = connection(PartyKind::Admin, &format!("a{i}"));
                registry.register(conn).await;
                receivers.push(rx);
            }

            // An admin that left must not receive anything
            let (gone, mut gone_rx) = connection(PartyKind::Admin, "gone");
            registry.register(Arc::clone(&gone)).await;
            registry.unregister(&gone).await;

            // Customers are never part of an admin broadcast
            let (customer, mut customer_rx) = connection(PartyKind::Customer, "c1");
            registry.register(customer).await;

            let delivered = registry.broadcast(PartyKind::Admin, ServerEvent::Pong).await;
            assert_eq!(delivered, n);

            for rx in receivers.iter_mut() {
                assert_eq!(rx.try_recv().unwrap(), ServerEvent::Pong);
                assert!(rx.try_recv().is_err());
            }
            assert!(gone_rx.try_recv().is_err());
            assert!(customer_rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn test_send_to_offline_party() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.send_to(PartyKind::Customer, "nobody", ServerEvent::Pong).await);
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_transport() {
        let registry = ConnectionRegistry::new();
        let (open, mut open_rx) = connection(PartyKind::Admin, "a1");
        let (closed, closed_rx) = connection(PartyKind::Admin, "a2");
        registry.register(open).await;
        registry.register(closed).await;
        drop(closed_rx);

        assert_eq!(registry.broadcast(PartyKind::Admin, ServerEvent::Pong).await, 1);
        assert!(open_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_registration_during_snapshot() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut receivers = Vec::new();
        for i in 0..10 {
            let (conn, rx) = connection(PartyKind::Admin, &format!("a{i}"));
            registry.register(conn).await;
            receivers.push(rx);
        }

        let snapshot = registry.all_of(PartyKind::Admin).await;

        let writer = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                for i in 10..20 {
                    let (tx, _rx) = mpsc::unbounded_channel();
                    let conn = Arc::new(Connection::new(
                        Uuid::new_v4(),
                        PartyKind::Admin,
                        format!("a{i}"),
                        None,
                        tx,
                    ));
                    registry.register(conn).await;
                }
            })
        };

        for conn in &snapshot {
            conn.send(ServerEvent::Pong);
        }
        writer.await.unwrap();

        assert_eq!(snapshot.len(), 10);
        for rx in receivers.iter_mut() {
            assert!(rx.try_recv().is_ok());
        }
        assert_eq!(registry.stats().await.admins_online, 20);
    }

    #[tokio::test]
    async fn test_online_and_stats() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        registry
            .register(Arc::new(Connection::new(
                Uuid::new_v4(),
                PartyKind::Customer,
                "c2",
                Some("Bob".into()),
                tx.clone(),
            )))
            .await;
        registry
            .register(Arc::new(Connection::new(
                Uuid::new_v4(),
                PartyKind::Customer,
                "c1",
                None,
                tx,
            )))
            .await;

        let online = registry.online(PartyKind::Customer).await;
        assert_eq!(online[0].party_id, "c1");
        assert_eq!(online[1].name.as_deref(), Some("Bob"));

        let stats = registry.stats().await;
        assert_eq!(stats.customers_online, 2);
        assert_eq!(stats.admins_online, 0);
    }
}
