/**
 * Chat Wire Protocol
 *
 * This module defines the JSON frames exchanged over a chat WebSocket.
 * Frames are discriminated by a `type` field on both directions.
 *
 * # Inbound Frames
 *
 * - `{"type":"message","content":...,"media_url"?:...,"media_type"?:...,"media_name"?:...}`
 * - `{"type":"typing","is_typing":bool}`
 * - `{"type":"read_receipt","message_ids"?:[int]}`
 *
 * # Outbound Frames
 *
 * - `{"type":"message",...}` - a persisted, server-stamped message
 * - `{"type":"status",...}` - presence change for a participant
 * - `{"type":"typing",...}` - transient typing indicator
 * - `{"type":"read",...}` - read receipt propagation
 *
 * # Close Codes
 *
 * The connection handler closes with `1008` (policy violation) when the
 * identity credential cannot be resolved, and `1003` (unsupported data,
 * repurposed as "unauthorized") when the authenticated user is not a
 * participant of the target conversation.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::model::{ChatMessage, MediaDescriptor};
use crate::chat::{ConversationId, MessageId, UserId};

/// Frames accepted from clients
///
/// Unknown `type` values or missing required fields fail deserialization;
/// the connection handler logs and drops such frames without closing the
/// connection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// A message to persist and fan out to the conversation
    Message {
        content: String,
        #[serde(default)]
        media_url: Option<String>,
        #[serde(default)]
        media_type: Option<String>,
        #[serde(default)]
        media_name: Option<String>,
    },
    /// Transient typing indicator, never persisted
    Typing { is_typing: bool },
    /// Acknowledge messages as read; `None` means all unread messages
    /// not authored by the acknowledging user
    ReadReceipt {
        #[serde(default)]
        message_ids: Option<Vec<MessageId>>,
    },
}

/// Presence status as carried on `status` frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// Frames sent to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A persisted message, carrying the store-assigned id and timestamp
    Message {
        id: MessageId,
        content: String,
        timestamp: DateTime<Utc>,
        sender_id: UserId,
        conversation_id: ConversationId,
        #[serde(skip_serializing_if = "Option::is_none")]
        media_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        media_name: Option<String>,
        is_self: bool,
    },
    /// Presence change for a conversation participant
    Status {
        user_id: UserId,
        status: PresenceStatus,
        timestamp: DateTime<Utc>,
    },
    /// Typing indicator relay
    Typing {
        user_id: UserId,
        username: String,
        is_typing: bool,
        conversation_id: ConversationId,
    },
    /// Read receipt propagation, listing the ids actually marked read
    Read {
        user_id: UserId,
        message_ids: Vec<MessageId>,
        conversation_id: ConversationId,
    },
}

impl ServerFrame {
    /// Build a `message` frame from a persisted message
    ///
    /// `is_self` is computed per recipient when replaying history; live
    /// broadcasts always exclude the sender so it is `false` there.
    pub fn from_message(message: &ChatMessage, is_self: bool) -> Self {
        let (media_url, media_type, media_name) = match &message.media {
            Some(MediaDescriptor { url, mime_type, name }) => {
                (Some(url.clone()), mime_type.clone(), name.clone())
            }
            None => (None, None, None),
        };
        Self::Message {
            id: message.id,
            content: message.content.clone(),
            timestamp: message.timestamp,
            sender_id: message.sender_id,
            conversation_id: message.conversation_id,
            media_url,
            media_type,
            media_name,
            is_self,
        }
    }

    /// Build a `status` frame stamped with the current server time
    pub fn status(user_id: UserId, status: PresenceStatus) -> Self {
        Self::Status {
            user_id,
            status,
            timestamp: Utc::now(),
        }
    }
}
