//! In-process message store
//!
//! Keeps every message in memory. Used by the test suite and when the relay
//! runs without `DATABASE_URL`; history does not survive a restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chatrelay_shared::{
    ChatMessage, ConversationSummary, CustomerId, NewChatMessage, SenderKind, StorageResult,
};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::MessageStore;

#[derive(Clone, Default)]
pub struct MemoryMessageStore {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored messages across all threads
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn append(&self, message: NewChatMessage) -> StorageResult<ChatMessage> {
        message.validate()?;
        let record = message.into_message(OffsetDateTime::now_utc());

        let mut messages = self.messages.write().await;
        messages.push(record.clone());

        tracing::trace!(
            customer_id = %record.customer_id,
            total = messages.len(),
            "Message stored in memory"
        );

        Ok(record)
    }

    async fn list_by_party(&self, customer_id: &CustomerId) -> StorageResult<Vec<ChatMessage>> {
        let messages = self.messages.read().await;
        let mut thread: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| &m.customer_id == customer_id)
            .cloned()
            .collect();

        // Stable sort keeps append order for equal timestamps
        thread.sort_by_key(|m| m.created_at);
        Ok(thread)
    }

    async fn mark_read(&self, customer_id: &CustomerId) -> StorageResult<u64> {
        let mut messages = self.messages.write().await;
        let mut updated = 0;

        for m in messages.iter_mut().filter(|m| {
            &m.customer_id == customer_id && m.sender == SenderKind::Customer && !m.read
        }) {
            m.read = true;
            updated += 1;
        }

        Ok(updated)
    }

    async fn list_conversations(&self) -> StorageResult<Vec<ConversationSummary>> {
        let messages = self.messages.read().await;
        let mut threads: HashMap<&CustomerId, ConversationSummary> = HashMap::new();

        for m in messages.iter() {
            let unread = i64::from(m.sender == SenderKind::Customer && !m.read);

            threads
                .entry(&m.customer_id)
                .and_modify(|summary| {
                    summary.unread_count += unread;
                    if m.created_at >= summary.last_message_time {
                        summary.last_message = m.body.clone();
                        summary.last_message_time = m.created_at;
                        summary.customer_name = m.sender_name.clone();
                    }
                })
                .or_insert_with(|| ConversationSummary {
                    customer_id: m.customer_id.clone(),
                    last_message: m.body.clone(),
                    last_message_time: m.created_at,
                    customer_name: m.sender_name.clone(),
                    unread_count: unread,
                });
        }

        let mut summaries: Vec<ConversationSummary> = threads.into_values().collect();
        summaries.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        Ok(summaries)
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }
}
