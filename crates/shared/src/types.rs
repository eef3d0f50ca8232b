//! Common types used across ChatRelay

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StorageError;

// =============================================================================
// Party Identities
// =============================================================================

/// Customer ID wrapper
///
/// Issued by the external auth collaborator, stable across reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CustomerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CustomerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Which side of the relay a connection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyKind {
    Customer,
    Admin,
}

impl PartyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyKind::Customer => "customer",
            PartyKind::Admin => "admin",
        }
    }
}

impl fmt::Display for PartyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Messages
// =============================================================================

/// Author of a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    Customer,
    Admin,
}

impl SenderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderKind::Customer => "customer",
            SenderKind::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(SenderKind::Customer),
            "admin" => Some(SenderKind::Admin),
            _ => None,
        }
    }
}

/// A persisted chat message
///
/// Every message belongs to exactly one customer thread, whoever sent it.
/// `read` only tracks admin-side acknowledgment of customer-authored messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub customer_id: CustomerId,
    pub sender: SenderKind,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub read: bool,
}

/// Input to a message store append
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub customer_id: CustomerId,
    pub sender: SenderKind,
    pub body: String,
    pub sender_name: Option<String>,
    pub admin_name: Option<String>,
    /// Filled in by the store when absent
    pub created_at: Option<OffsetDateTime>,
}

impl NewChatMessage {
    pub fn from_customer(
        customer_id: CustomerId,
        body: impl Into<String>,
        sender_name: Option<String>,
    ) -> Self {
        Self {
            customer_id,
            sender: SenderKind::Customer,
            body: body.into(),
            sender_name,
            admin_name: None,
            created_at: None,
        }
    }

    pub fn from_admin(
        customer_id: CustomerId,
        body: impl Into<String>,
        admin_name: Option<String>,
    ) -> Self {
        Self {
            customer_id,
            sender: SenderKind::Admin,
            body: body.into(),
            sender_name: None,
            admin_name,
            created_at: None,
        }
    }

    pub fn at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Reject messages without a thread or with a blank body
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.customer_id.as_str().trim().is_empty() {
            return Err(StorageError::Invalid("customer id is required".into()));
        }
        if self.body.trim().is_empty() {
            return Err(StorageError::Invalid("message body cannot be empty".into()));
        }
        Ok(())
    }

    /// Materialize the stored record with a fresh id
    pub fn into_message(self, now: OffsetDateTime) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            customer_id: self.customer_id,
            sender: self.sender,
            body: self.body,
            sender_name: self.sender_name,
            admin_name: self.admin_name,
            created_at: self.created_at.unwrap_or(now),
            read: false,
        }
    }
}

/// Derived per-thread summary for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub customer_id: CustomerId,
    pub last_message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_message_time: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub unread_count: i64,
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(Debug, FromRow)]
pub struct ChatMessageRow {
    pub id: Uuid,
    pub customer_id: String,
    pub sender: String,
    pub body: String,
    pub sender_name: Option<String>,
    pub admin_name: Option<String>,
    pub created_at: OffsetDateTime,
    pub read: bool,
}

impl TryFrom<ChatMessageRow> for ChatMessage {
    type Error = StorageError;

    fn try_from(row: ChatMessageRow) -> Result<Self, Self::Error> {
        let sender = SenderKind::parse(&row.sender).ok_or_else(|| {
            StorageError::Database(format!("unknown sender kind '{}'", row.sender))
        })?;

        Ok(ChatMessage {
            id: row.id,
            customer_id: CustomerId(row.customer_id),
            sender,
            body: row.body,
            sender_name: row.sender_name,
            admin_name: row.admin_name,
            created_at: row.created_at,
            read: row.read,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct ConversationRow {
    pub customer_id: String,
    pub last_message: String,
    pub last_message_time: OffsetDateTime,
    pub customer_name: Option<String>,
    pub unread_count: i64,
}

impl From<ConversationRow> for ConversationSummary {
    fn from(row: ConversationRow) -> Self {
        ConversationSummary {
            customer_id: CustomerId(row.customer_id),
            last_message: row.last_message,
            last_message_time: row.last_message_time,
            customer_name: row.customer_name,
            unread_count: row.unread_count,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_validation() {
        let ok = NewChatMessage::from_customer("c1".into(), "hello", None);
        assert!(ok.validate().is_ok());

        let blank = NewChatMessage::from_customer("c1".into(), "   ", None);
        assert!(matches!(blank.validate(), Err(StorageError::Invalid(_))));

        let no_thread = NewChatMessage::from_admin("".into(), "hi", Some("Sam".into()));
        assert!(matches!(no_thread.validate(), Err(StorageError::Invalid(_))));
    }

    #[test]
    fn test_into_message_keeps_explicit_timestamp() {
        let at = OffsetDateTime::UNIX_EPOCH;
        let msg = NewChatMessage::from_admin("c1".into(), "hi", None)
            .at(at)
            .into_message(OffsetDateTime::now_utc());
        assert_eq!(msg.created_at, at);
        assert!(!msg.read);
        assert_eq!(msg.sender, SenderKind::Admin);
    }

    #[test]
    fn test_message_serialization() {
        let msg = NewChatMessage::from_customer("c1".into(), "hello", Some("Ann".into()))
            .at(OffsetDateTime::UNIX_EPOCH)
            .into_message(OffsetDateTime::now_utc());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["customerId"], "c1");
        assert_eq!(json["sender"], "customer");
        assert_eq!(json["senderName"], "Ann");
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
        assert!(json.get("adminName").is_none());
    }

    #[test]
    fn test_row_with_unknown_sender_is_rejected() {
        let row = ChatMessageRow {
            id: Uuid::new_v4(),
            customer_id: "c1".into(),
            sender: "bot".into(),
            body: "hi".into(),
            sender_name: None,
            admin_name: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            read: false,
        };
        assert!(ChatMessage::try_from(row).is_err());
    }
}
