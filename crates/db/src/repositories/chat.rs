use sqlx::Row;

use chatdesk_core::domain::chat::{ChatMessage, MessageDirection};
use chatdesk_core::domain::contact::ContactId;

use super::{decode_err, parse_timestamp, ChatRepository, RepositoryError};
use crate::DbPool;

pub struct SqlChatRepository {
    pool: DbPool,
}

impl SqlChatRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<ChatMessage, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let contact_id: String = row.try_get("contact_id").map_err(decode_err)?;
    let direction: String = row.try_get("direction").map_err(decode_err)?;
    let body: String = row.try_get("body").map_err(decode_err)?;
    let sent_at: String = row.try_get("sent_at").map_err(decode_err)?;

    let direction = MessageDirection::parse(&direction).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown message direction `{direction}`"))
    })?;

    Ok(ChatMessage {
        id,
        contact_id: ContactId(contact_id),
        direction,
        body,
        sent_at: parse_timestamp(&sent_at)?,
    })
}

#[async_trait::async_trait]
impl ChatRepository for SqlChatRepository {
    /// Most recent `limit` messages, returned oldest first.
    async fn list_for_contact(
        &self,
        contact_id: &ContactId,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, contact_id, direction, body, sent_at FROM (
                 SELECT id, contact_id, direction, body, sent_at
                 FROM chat_message WHERE contact_id = ?
                 ORDER BY sent_at DESC, id DESC
                 LIMIT ?
             ) ORDER BY sent_at ASC, id ASC",
        )
        .bind(&contact_id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_message).collect()
    }

    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO chat_message (id, contact_id, direction, body, sent_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.contact_id.0)
        .bind(message.direction.as_str())
        .bind(&message.body)
        .bind(message.sent_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
