//! WebSocket connection management
//!
//! A `Session` is one open socket. Once the socket joins as a customer or an
//! admin it gets a `Connection`, the registry-owned handle bound to exactly
//! one party identity.

use std::sync::Arc;

use chatrelay_shared::PartyKind;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::ServerEvent;
use crate::auth::AuthIdentity;

/// Live handle for one joined party
#[derive(Debug)]
pub struct Connection {
    /// Identity of this binding; compared before unregistering
    pub connection_id: Uuid,

    /// Socket this connection belongs to
    pub session_id: Uuid,

    pub kind: PartyKind,

    pub party_id: String,

    pub name: Option<String>,

    /// Channel to send events to this connection
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl Connection {
    /// Create a new connection
    pub fn new(
        session_id: Uuid,
        kind: PartyKind,
        party_id: impl Into<String>,
        name: Option<String>,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            session_id,
            kind,
            party_id: party_id.into(),
            name,
            sender,
        }
    }

    /// Push an event to this connection
    ///
    /// Returns false when the socket has already gone away; the event is
    /// dropped.
    pub fn send(&self, event: ServerEvent) -> bool {
        match self.sender.send(event) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(
                    connection_id = %self.connection_id,
                    party_id = %self.party_id,
                    event = err.0.name(),
                    "Dropped event for closed connection"
                );
                false
            }
        }
    }
}

/// Per-socket state owned by the transport reader loop
#[derive(Debug)]
pub struct Session {
    pub session_id: Uuid,

    /// Identity pinned by a validated bearer token, if one was presented
    pub identity: Option<AuthIdentity>,

    /// Registry binding created by the last successful join
    pub bound: Option<Arc<Connection>>,

    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl Session {
    pub fn new(sender: mpsc::UnboundedSender<ServerEvent>, identity: Option<AuthIdentity>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            identity,
            bound: None,
            sender,
        }
    }

    /// Push an event straight back to this socket
    pub fn send(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    /// Create a connection for this socket bound to `party_id`
    pub fn bind(&self, kind: PartyKind, party_id: &str, name: Option<String>) -> Arc<Connection> {
        Arc::new(Connection::new(
            self.session_id,
            kind,
            party_id,
            name,
            self.sender.clone(),
        ))
    }

    /// Display name of the current binding when it matches `kind`/`party_id`
    pub fn bound_name(&self, kind: PartyKind, party_id: &str) -> Option<String> {
        self.bound
            .as_ref()
            .filter(|c| c.kind == kind && c.party_id == party_id)
            .and_then(|c| c.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connection_send_and_close() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = Connection::new(Uuid::new_v4(), PartyKind::Admin, "a1", None, tx);

        assert!(conn.send(ServerEvent::Pong));
        assert_eq!(rx.recv().await, Some(ServerEvent::Pong));

        drop(rx);
        assert!(!conn.send(ServerEvent::Pong));
    }

    #[tokio::test]
    async fn test_each_binding_gets_its_own_identity() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = Session::new(tx, None);

        let first = session.bind(PartyKind::Customer, "c1", Some("Ann".into()));
        let second = session.bind(PartyKind::Customer, "c1", Some("Ann".into()));

        assert_eq!(first.session_id, second.session_id);
        assert_ne!(first.connection_id, second.connection_id);
    }

    #[tokio::test]
    async fn test_bound_name_matches_kind_and_id() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = Session::new(tx, None);
        session.bound = Some(session.bind(PartyKind::Customer, "c1", Some("Ann".into())));

        assert_eq!(session.bound_name(PartyKind::Customer, "c1").as_deref(), Some("Ann"));
        assert_eq!(session.bound_name(PartyKind::Customer, "c2"), None);
        assert_eq!(session.bound_name(PartyKind::Admin, "c1"), None);
    }
}
