//! Relay engine
//!
//! Turns inbound party events into registry updates, message appends and
//! outbound fanout. The engine keeps no state of its own between events; all
//! shared state lives in the `ConnectionRegistry`.
//!
//! Appends are issued on a spawned task and never awaited by the event path,
//! so a slow or failing store degrades durability but not live delivery.

use std::sync::Arc;

use chatrelay_shared::{CustomerId, NewChatMessage, PartyKind, SenderKind};
use time::OffsetDateTime;

use super::connection::{Connection, Session};
use super::events::{ChatMessageEvent, ClientEvent, ServerEvent};
use super::registry::ConnectionRegistry;
use crate::store::MessageStore;

/// Reasons an inbound event is dropped without fanout
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Validation error: {0}")]
    Validation(String),
}

fn invalid(message: impl Into<String>) -> RelayError {
    RelayError::Validation(message.into())
}

/// Routes chat events between customers and admins
#[derive(Clone)]
pub struct RelayEngine {
    registry: Arc<ConnectionRegistry>,
    store: Arc<dyn MessageStore>,
}

impl RelayEngine {
    pub fn new(registry: Arc<ConnectionRegistry>, store: Arc<dyn MessageStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Handle one inbound event from `session`
    pub async fn handle(&self, session: &mut Session, event: ClientEvent) -> Result<(), RelayError> {
        tracing::trace!(session_id = %session.session_id, event = event.name(), "Inbound event");

        match event {
            ClientEvent::CustomerJoin { customer_id, name } => {
                let customer_id = required_id(customer_id, "customerId")?;
                authorize(session, PartyKind::Customer, &customer_id)?;
                let name = name.or_else(|| identity_name(session));

                let conn = self.join(session, PartyKind::Customer, &customer_id, name.clone()).await;
                self.registry
                    .broadcast(
                        PartyKind::Admin,
                        ServerEvent::CustomerOnline {
                            customer_id: conn.party_id.clone().into(),
                            name,
                        },
                    )
                    .await;
            }

            ClientEvent::AdminJoin { admin_id, name } => {
                let admin_id = required_id(admin_id, "adminId")?;
                authorize(session, PartyKind::Admin, &admin_id)?;
                let name = name.or_else(|| identity_name(session));

                self.join(session, PartyKind::Admin, &admin_id, name).await;
            }

            ClientEvent::CustomerMessage {
                customer_id,
                body,
                name,
            } => {
                let customer_id = required_id(customer_id, "customerId")?;
                authorize(session, PartyKind::Customer, &customer_id)?;
                let body = required_body(body)?;
                let name = name.or_else(|| session.bound_name(PartyKind::Customer, &customer_id));

                let now = OffsetDateTime::now_utc();
                let customer_id = CustomerId(customer_id);
                self.persist(
                    NewChatMessage::from_customer(customer_id.clone(), body.clone(), name.clone())
                        .at(now),
                );

                let payload = ChatMessageEvent {
                    customer_id,
                    customer_name: name,
                    message: body,
                    sender: SenderKind::Customer,
                    admin_name: None,
                    timestamp: now,
                };

                self.registry
                    .broadcast(PartyKind::Admin, ServerEvent::NewCustomerMessage(payload.clone()))
                    .await;
                session.send(ServerEvent::MessageSent(payload));
            }

            ClientEvent::AdminMessage {
                customer_id,
                body,
                admin_name,
            } => {
                let customer_id = required_id(customer_id, "customerId")?;
                require_admin(session)?;
                let body = required_body(body)?;
                let admin_name = admin_name.or_else(|| {
                    session
                        .bound
                        .as_ref()
                        .filter(|c| c.kind == PartyKind::Admin)
                        .and_then(|c| c.name.clone())
                });

                let now = OffsetDateTime::now_utc();
                let customer_id = CustomerId(customer_id);
                self.persist(
                    NewChatMessage::from_admin(customer_id.clone(), body.clone(), admin_name.clone())
                        .at(now),
                );

                let payload = ChatMessageEvent {
                    customer_id,
                    customer_name: None,
                    message: body,
                    sender: SenderKind::Admin,
                    admin_name,
                    timestamp: now,
                };

                self.registry
                    .send_to(
                        PartyKind::Customer,
                        payload.customer_id.as_str(),
                        ServerEvent::AdminReply(payload.clone()),
                    )
                    .await;
                self.registry
                    .broadcast(PartyKind::Admin, ServerEvent::AdminMessageSent(payload))
                    .await;
            }

            ClientEvent::CustomerTyping { customer_id, name } => {
                let customer_id = required_id(customer_id, "customerId")?;
                authorize(session, PartyKind::Customer, &customer_id)?;

                let Some(conn) = self.registry.lookup(PartyKind::Customer, &customer_id).await
                else {
                    tracing::debug!(customer_id = %customer_id, "Typing from unregistered customer ignored");
                    return Ok(());
                };

                self.registry
                    .broadcast(
                        PartyKind::Admin,
                        ServerEvent::CustomerTyping {
                            customer_id: customer_id.into(),
                            name: name.or_else(|| conn.name.clone()),
                        },
                    )
                    .await;
            }

            ClientEvent::AdminTyping { customer_id } => {
                let customer_id = required_id(customer_id, "customerId")?;
                require_admin(session)?;

                self.registry
                    .send_to(
                        PartyKind::Customer,
                        &customer_id,
                        ServerEvent::AdminTyping {
                            customer_id: customer_id.clone().into(),
                        },
                    )
                    .await;
            }

            ClientEvent::Ping => {
                session.send(ServerEvent::Pong);
            }
        }

        Ok(())
    }

    /// Release whatever registry slot this session owns
    ///
    /// Called once when the transport closes, whether cleanly or not.
    pub async fn disconnect(&self, session: &mut Session) {
        if let Some(conn) = session.bound.take() {
            self.release(&conn).await;
        }
    }

    /// Bind the session to a party, replacing any earlier binding it held
    async fn join(
        &self,
        session: &mut Session,
        kind: PartyKind,
        party_id: &str,
        name: Option<String>,
    ) -> Arc<Connection> {
        if let Some(previous) = session.bound.take() {
            // Rejoining under the same identity keeps the slot; only a switch
            // to another identity releases the old one.
            if previous.kind != kind || previous.party_id != party_id {
                self.release(&previous).await;
            }
        }

        let conn = session.bind(kind, party_id, name);
        if let Some(superseded) = self.registry.register(Arc::clone(&conn)).await {
            if superseded.session_id != session.session_id {
                tracing::info!(
                    kind = %kind,
                    party_id = %party_id,
                    old_session_id = %superseded.session_id,
                    new_session_id = %session.session_id,
                    "Connection superseded by newer join"
                );
            }
        }
        session.bound = Some(Arc::clone(&conn));
        conn
    }

    async fn release(&self, conn: &Connection) {
        let released = self.registry.unregister(conn).await;
        if released && conn.kind == PartyKind::Customer {
            self.registry
                .broadcast(
                    PartyKind::Admin,
                    ServerEvent::CustomerOffline {
                        customer_id: conn.party_id.clone().into(),
                    },
                )
                .await;
        }
    }

    /// Issue an append without waiting for it
    fn persist(&self, message: NewChatMessage) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let customer_id = message.customer_id.clone();
            let sender = message.sender;

            match store.append(message).await {
                Ok(stored) => {
                    tracing::debug!(
                        message_id = %stored.id,
                        customer_id = %customer_id,
                        sender = sender.as_str(),
                        "Chat message persisted"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        customer_id = %customer_id,
                        sender = sender.as_str(),
                        "Failed to persist chat message"
                    );
                }
            }
        });
    }
}

fn required_id(id: String, field: &str) -> Result<String, RelayError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(invalid(format!("{field} is required")));
    }
    Ok(id.to_string())
}

fn required_body(body: String) -> Result<String, RelayError> {
    if body.trim().is_empty() {
        return Err(invalid("Message body cannot be empty"));
    }
    Ok(body)
}

fn identity_name(session: &Session) -> Option<String> {
    session.identity.as_ref().and_then(|i| i.name.clone())
}

/// A token-pinned session may only act as the party its token names
fn authorize(session: &Session, kind: PartyKind, party_id: &str) -> Result<(), RelayError> {
    match &session.identity {
        None => Ok(()),
        Some(identity) if identity.kind == kind && identity.party_id == party_id => Ok(()),
        Some(identity) => Err(invalid(format!(
            "Token for {} '{}' cannot act as {} '{}'",
            identity.kind, identity.party_id, kind, party_id
        ))),
    }
}

fn require_admin(session: &Session) -> Result<(), RelayError> {
    match &session.identity {
        Some(identity) if identity.kind != PartyKind::Admin => {
            Err(invalid("Only admins can send this event"))
        }
        _ => Ok(()),
    }
}
