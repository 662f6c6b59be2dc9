//! Conversation Store Adapter
//!
//! The chat core does not own message history; it consumes a store through
//! the `ConversationStore` trait. Production wires the Postgres-backed
//! `PgStore`; `MemoryStore` backs development without a database and the
//! test suite.
//!
//! The store handles its own internal concurrency (relational transactions
//! in the Postgres case); the chat core treats each call as one atomic
//! unit of work and adds no locking of its own.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::chat::model::{ChatMessage, Conversation, MediaDescriptor};
use crate::chat::{ConversationId, MessageId, UserId};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors surfaced by a conversation store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conversation {0} not found")]
    ConversationNotFound(ConversationId),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored record violates a structural invariant (unknown kind text,
    /// direct conversation with the wrong participant count)
    #[error("corrupt record: {message}")]
    Corrupt { message: String },
}

/// Persistent conversation and message storage consumed by the chat core
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Look up a conversation with its participant set
    async fn get_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError>;

    /// Membership test without materializing the full conversation
    async fn is_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, StoreError>;

    /// Persist a message; the store assigns the id and timestamp
    async fn save_message(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        content: &str,
        media: Option<MediaDescriptor>,
    ) -> Result<ChatMessage, StoreError>;

    /// Set the read timestamp on messages in the conversation
    ///
    /// Only messages not authored by `reader_id` and not yet read are
    /// touched. `message_ids` of `None` means every unread message not
    /// authored by the reader. Returns the ids actually updated.
    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader_id: UserId,
        message_ids: Option<&[MessageId]>,
    ) -> Result<Vec<MessageId>, StoreError>;

    /// Most recent messages, newest first
    ///
    /// `before_id` pages backwards through history: only messages with a
    /// smaller id are returned.
    async fn list_recent_messages(
        &self,
        conversation_id: ConversationId,
        before_id: Option<MessageId>,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, StoreError>;
}
