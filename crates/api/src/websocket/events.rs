//! WebSocket event types and serialization
//!
//! Defines all client-to-server and server-to-client event types
//! with type-safe serde serialization. Every frame is a JSON object whose
//! `type` field carries the kebab-case event name.

use chatrelay_shared::{CustomerId, SenderKind};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Client-to-Server Events
// =============================================================================

/// Events sent from client to server
///
/// The legacy storefront widget sends `userId`, `message` and `userName`;
/// those names are accepted as aliases.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Customer announces presence
    CustomerJoin {
        #[serde(alias = "userId")]
        customer_id: String,
        #[serde(default)]
        name: Option<String>,
    },

    /// Admin announces presence
    AdminJoin {
        admin_id: String,
        #[serde(default)]
        name: Option<String>,
    },

    /// Customer writes into their thread
    CustomerMessage {
        #[serde(alias = "userId")]
        customer_id: String,
        #[serde(alias = "message")]
        body: String,
        #[serde(default, alias = "userName")]
        name: Option<String>,
    },

    /// Admin replies into a customer thread
    AdminMessage {
        #[serde(alias = "userId")]
        customer_id: String,
        #[serde(alias = "message")]
        body: String,
        #[serde(default)]
        admin_name: Option<String>,
    },

    /// Customer is typing
    CustomerTyping {
        #[serde(alias = "userId")]
        customer_id: String,
        #[serde(default, alias = "userName")]
        name: Option<String>,
    },

    /// Admin is typing into a customer thread
    AdminTyping {
        #[serde(alias = "userId")]
        customer_id: String,
    },

    /// Heartbeat ping to keep connection alive
    Ping,
}

impl ClientEvent {
    /// Event name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::CustomerJoin { .. } => "customer-join",
            ClientEvent::AdminJoin { .. } => "admin-join",
            ClientEvent::CustomerMessage { .. } => "customer-message",
            ClientEvent::AdminMessage { .. } => "admin-message",
            ClientEvent::CustomerTyping { .. } => "customer-typing",
            ClientEvent::AdminTyping { .. } => "admin-typing",
            ClientEvent::Ping => "ping",
        }
    }
}

// =============================================================================
// Server-to-Client Events
// =============================================================================

/// Events sent from server to client
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Connection acknowledged
    Connected { session_id: Uuid },

    /// A customer joined
    CustomerOnline {
        customer_id: CustomerId,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// A customer's live connection went away
    CustomerOffline { customer_id: CustomerId },

    /// Customer message, fanned out to every admin
    NewCustomerMessage(ChatMessageEvent),

    /// Echo of a customer message back to its sender
    MessageSent(ChatMessageEvent),

    /// Admin reply delivered to the customer
    AdminReply(ChatMessageEvent),

    /// Admin reply, fanned out to every admin
    AdminMessageSent(ChatMessageEvent),

    /// Customer typing signal; receivers expire it themselves
    CustomerTyping {
        customer_id: CustomerId,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Admin typing signal; receivers expire it themselves
    AdminTyping { customer_id: CustomerId },

    /// Heartbeat response
    Pong,

    /// Error message
    Error { message: String },
}

impl ServerEvent {
    /// Event name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "connected",
            ServerEvent::CustomerOnline { .. } => "customer-online",
            ServerEvent::CustomerOffline { .. } => "customer-offline",
            ServerEvent::NewCustomerMessage(_) => "new-customer-message",
            ServerEvent::MessageSent(_) => "message-sent",
            ServerEvent::AdminReply(_) => "admin-reply",
            ServerEvent::AdminMessageSent(_) => "admin-message-sent",
            ServerEvent::CustomerTyping { .. } => "customer-typing",
            ServerEvent::AdminTyping { .. } => "admin-typing",
            ServerEvent::Pong => "pong",
            ServerEvent::Error { .. } => "error",
        }
    }
}

// =============================================================================
// Event Data Structures
// =============================================================================

/// Chat message as pushed over the wire
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageEvent {
    pub customer_id: CustomerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub message: String,
    pub sender: SenderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_deserialization() {
        let json = r#"{"type":"customer-message","customerId":"c1","body":"hello","name":"Ann"}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        match event {
            ClientEvent::CustomerMessage {
                customer_id,
                body,
                name,
            } => {
                assert_eq!(customer_id, "c1");
                assert_eq!(body, "hello");
                assert_eq!(name.as_deref(), Some("Ann"));
            }
            _ => panic!("Expected CustomerMessage event"),
        }
    }

    #[test]
    fn test_legacy_field_names_are_accepted() {
        let json = r#"{"type":"customer-message","userId":"c1","message":"hi","userName":"Ann"}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(
            event,
            ClientEvent::CustomerMessage { ref customer_id, ref body, .. }
                if customer_id == "c1" && body == "hi"
        ));

        let json = r#"{"type":"admin-message","userId":"c1","message":"hey","adminName":"Sam"}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(
            event,
            ClientEvent::AdminMessage { ref admin_name, .. } if admin_name.as_deref() == Some("Sam")
        ));
    }

    #[test]
    fn test_missing_id_fails_to_parse() {
        let json = r#"{"type":"customer-join","name":"Ann"}"#;
        assert!(serde_json::from_str::<ClientEvent>(json).is_err());
    }

    #[test]
    fn test_server_event_serialization() {
        let event = ServerEvent::Pong;
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);

        let event = ServerEvent::CustomerOffline {
            customer_id: "c1".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"customer-offline","customerId":"c1"}"#);
    }

    #[test]
    fn test_message_event_is_flattened_next_to_type() {
        let event = ServerEvent::NewCustomerMessage(ChatMessageEvent {
            customer_id: "c1".into(),
            customer_name: Some("Ann".into()),
            message: "hello".into(),
            sender: SenderKind::Customer,
            admin_name: None,
            timestamp: OffsetDateTime::UNIX_EPOCH,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "new-customer-message");
        assert_eq!(value["customerId"], "c1");
        assert_eq!(value["message"], "hello");
        assert_eq!(value["sender"], "customer");
        assert_eq!(value["timestamp"], "1970-01-01T00:00:00Z");
        assert!(value.get("adminName").is_none());
    }
}
