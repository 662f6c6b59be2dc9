//! Postgres-backed conversation store
//!
//! SQL bodies for the `ConversationStore` trait. Schema lives in
//! `migrations/`; `server::config::load_database` runs the migrations at
//! startup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::chat::model::{ChatMessage, Conversation, ConversationKind, MediaDescriptor};
use crate::chat::store::{ConversationStore, StoreError};
use crate::chat::{ConversationId, MessageId, UserId};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn message_from_row(row: &sqlx::postgres::PgRow) -> ChatMessage {
    let media_url: Option<String> = row.get("media_url");
    let media = media_url.map(|url| MediaDescriptor {
        url,
        mime_type: row.get("media_type"),
        name: row.get("media_name"),
    });
    ChatMessage {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        sender_id: row.get("sender_id"),
        content: row.get("content"),
        media,
        timestamp: row.get("created_at"),
        read_at: row.get("read_at"),
    }
}

#[async_trait]
impl ConversationStore for PgStore {
    async fn get_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, kind, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let kind_text: String = row.get("kind");
        let kind: ConversationKind = kind_text.parse().map_err(|error| StoreError::Corrupt {
            message: format!("conversation {}: {}", conversation_id, error),
        })?;
        let created_at: DateTime<Utc> = row.get("created_at");
        let updated_at: DateTime<Utc> = row.get("updated_at");

        let participants: Vec<UserId> = sqlx::query_scalar(
            r#"
            SELECT user_id
            FROM conversation_participants
            WHERE conversation_id = $1
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        let conversation =
            Conversation::new(conversation_id, kind, participants, created_at, updated_at)
                .map_err(|error| StoreError::Corrupt {
                    message: format!("conversation {}: {}", conversation_id, error),
                })?;
        Ok(Some(conversation))
    }

    async fn is_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM conversation_participants
                WHERE conversation_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn save_message(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        content: &str,
        media: Option<MediaDescriptor>,
    ) -> Result<ChatMessage, StoreError> {
        let (media_url, media_type, media_name) = match &media {
            Some(descriptor) => (
                Some(descriptor.url.as_str()),
                descriptor.mime_type.as_deref(),
                descriptor.name.as_deref(),
            ),
            None => (None, None, None),
        };

        // Insert and conversation bump commit together; a message must not
        // exist without its conversation's updated_at reflecting it.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO messages (conversation_id, sender_id, content, media_url, media_type, media_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .bind(media_url)
        .bind(media_type)
        .bind(media_name)
        .fetch_one(&mut *tx)
        .await?;

        let id: MessageId = row.get("id");
        let created_at: DateTime<Utc> = row.get("created_at");

        sqlx::query(
            r#"
            UPDATE conversations SET updated_at = $2 WHERE id = $1
            "#,
        )
        .bind(conversation_id)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ChatMessage {
            id,
            conversation_id,
            sender_id,
            content: content.to_string(),
            media,
            timestamp: created_at,
            read_at: None,
        })
    }

    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader_id: UserId,
        message_ids: Option<&[MessageId]>,
    ) -> Result<Vec<MessageId>, StoreError> {
        let ids_filter: Option<Vec<MessageId>> = message_ids.map(|ids| ids.to_vec());

        let mut updated: Vec<MessageId> = sqlx::query_scalar(
            r#"
            UPDATE messages
            SET read_at = NOW()
            WHERE conversation_id = $1
              AND sender_id <> $2
              AND read_at IS NULL
              AND ($3::BIGINT[] IS NULL OR id = ANY($3))
            RETURNING id
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .bind(ids_filter)
        .fetch_all(&self.pool)
        .await?;

        updated.sort_unstable();
        Ok(updated)
    }

    async fn list_recent_messages(
        &self,
        conversation_id: ConversationId,
        before_id: Option<MessageId>,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, content,
                   media_url, media_type, media_name, created_at, read_at
            FROM messages
            WHERE conversation_id = $1
              AND ($2::BIGINT IS NULL OR id < $2)
            ORDER BY id DESC
            LIMIT $3
            "#,
        )
        .bind(conversation_id)
        .bind(before_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(message_from_row).collect())
    }
}
