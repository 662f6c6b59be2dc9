//! In-memory conversation store
//!
//! Backs development runs without a configured database and the test
//! suite. Single mutex around the whole state; every trait method is one
//! atomic unit of work, matching what the Postgres store gets from
//! transactions.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::chat::model::{ChatMessage, Conversation, MediaDescriptor};
use crate::chat::store::{ConversationStore, StoreError};
use crate::chat::{ConversationId, MessageId, UserId};

#[derive(Default)]
struct Inner {
    conversations: HashMap<ConversationId, Conversation>,
    messages: Vec<ChatMessage>,
    next_message_id: MessageId,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a conversation; the chat core itself never creates them
    pub fn insert_conversation(&self, conversation: Conversation) {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.conversations.insert(conversation.id, conversation);
    }

    pub fn message_count(&self) -> usize {
        self.inner.lock().expect("memory store poisoned").messages.len()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn get_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner.conversations.get(&conversation_id).cloned())
    }

    async fn is_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner
            .conversations
            .get(&conversation_id)
            .map(|conversation| conversation.is_participant(user_id))
            .unwrap_or(false))
    }

    async fn save_message(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        content: &str,
        media: Option<MediaDescriptor>,
    ) -> Result<ChatMessage, StoreError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        if !inner.conversations.contains_key(&conversation_id) {
            return Err(StoreError::ConversationNotFound(conversation_id));
        }

        // Timestamps must be non-decreasing per sender; clamping against
        // the conversation's latest message covers clock regressions.
        let latest = inner
            .messages
            .iter()
            .filter(|message| message.conversation_id == conversation_id)
            .map(|message| message.timestamp)
            .max();
        let timestamp = match latest {
            Some(previous) => Utc::now().max(previous),
            None => Utc::now(),
        };

        inner.next_message_id += 1;
        let message = ChatMessage {
            id: inner.next_message_id,
            conversation_id,
            sender_id,
            content: content.to_string(),
            media,
            timestamp,
            read_at: None,
        };
        inner.messages.push(message.clone());
        if let Some(conversation) = inner.conversations.get_mut(&conversation_id) {
            conversation.updated_at = timestamp;
        }
        Ok(message)
    }

    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader_id: UserId,
        message_ids: Option<&[MessageId]>,
    ) -> Result<Vec<MessageId>, StoreError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let now = Utc::now();
        let mut updated = Vec::new();
        for message in inner.messages.iter_mut() {
            if message.conversation_id != conversation_id
                || message.sender_id == reader_id
                || message.read_at.is_some()
            {
                continue;
            }
            if let Some(ids) = message_ids {
                if !ids.contains(&message.id) {
                    continue;
                }
            }
            message.read_at = Some(now);
            updated.push(message.id);
        }
        updated.sort_unstable();
        Ok(updated)
    }

    async fn list_recent_messages(
        &self,
        conversation_id: ConversationId,
        before_id: Option<MessageId>,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        let mut recent: Vec<ChatMessage> = inner
            .messages
            .iter()
            .filter(|message| {
                message.conversation_id == conversation_id
                    && before_id.map(|before| message.id < before).unwrap_or(true)
            })
            .cloned()
            .collect();
        recent.sort_unstable_by_key(|message| std::cmp::Reverse(message.id));
        recent.truncate(limit.max(0) as usize);
        Ok(recent)
    }
}
