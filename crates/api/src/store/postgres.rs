//! Postgres-backed message store

use async_trait::async_trait;
use chatrelay_shared::{
    ChatMessage, ChatMessageRow, ConversationRow, ConversationSummary, CustomerId, NewChatMessage,
    StorageResult,
};
use sqlx::PgPool;
use time::OffsetDateTime;

use super::MessageStore;

#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn append(&self, message: NewChatMessage) -> StorageResult<ChatMessage> {
        message.validate()?;
        let record = message.into_message(OffsetDateTime::now_utc());

        let row: ChatMessageRow = sqlx::query_as(
            r#"
            INSERT INTO chat_messages (id, customer_id, sender, body, sender_name, admin_name, created_at, read)
            VALUES ($1, $2, $3, $4, $5, $6, $7, false)
            RETURNING id, customer_id, sender, body, sender_name, admin_name, created_at, read
            "#,
        )
        .bind(record.id)
        .bind(record.customer_id.as_str())
        .bind(record.sender.as_str())
        .bind(&record.body)
        .bind(&record.sender_name)
        .bind(&record.admin_name)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list_by_party(&self, customer_id: &CustomerId) -> StorageResult<Vec<ChatMessage>> {
        let rows: Vec<ChatMessageRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, sender, body, sender_name, admin_name, created_at, read
            FROM chat_messages
            WHERE customer_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(customer_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ChatMessage::try_from).collect()
    }

    async fn mark_read(&self, customer_id: &CustomerId) -> StorageResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE chat_messages
            SET read = true
            WHERE customer_id = $1 AND sender = 'customer' AND read = false
            "#,
        )
        .bind(customer_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_conversations(&self) -> StorageResult<Vec<ConversationSummary>> {
        let rows: Vec<ConversationRow> = sqlx::query_as(
            r#"
            SELECT DISTINCT ON (m.customer_id)
                m.customer_id,
                m.body AS last_message,
                m.created_at AS last_message_time,
                m.sender_name AS customer_name,
                (
                    SELECT COUNT(*)
                    FROM chat_messages u
                    WHERE u.customer_id = m.customer_id
                      AND u.sender = 'customer'
                      AND u.read = false
                ) AS unread_count
            FROM chat_messages m
            ORDER BY m.customer_id, m.created_at DESC, m.seq DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut summaries: Vec<ConversationSummary> =
            rows.into_iter().map(ConversationSummary::from).collect();
        summaries.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        Ok(summaries)
    }

    async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
