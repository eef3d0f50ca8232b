//! Message store gateway
//!
//! The relay appends every message through this trait and the dashboard
//! routes read history from it. Two backends exist: Postgres for deployments
//! and an in-process store for tests and database-less runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chatrelay_shared::{ChatMessage, ConversationSummary, CustomerId, NewChatMessage, StorageResult};

pub use memory::MemoryMessageStore;
pub use postgres::PgMessageStore;

/// Durable message storage consumed by the relay engine and dashboard routes
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message, assigning `created_at` when absent
    ///
    /// Duplicate content is never rejected.
    async fn append(&self, message: NewChatMessage) -> StorageResult<ChatMessage>;

    /// All messages of one customer thread, oldest first
    async fn list_by_party(&self, customer_id: &CustomerId) -> StorageResult<Vec<ChatMessage>>;

    /// Mark every unread customer-authored message in the thread as read
    ///
    /// Returns the number of messages that changed state; a repeated call
    /// returns 0.
    async fn mark_read(&self, customer_id: &CustomerId) -> StorageResult<u64>;

    /// One summary per thread, most recent activity first
    async fn list_conversations(&self) -> StorageResult<Vec<ConversationSummary>>;

    /// Cheap reachability probe for readiness checks
    async fn ping(&self) -> StorageResult<()>;
}
