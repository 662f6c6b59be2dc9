//! Domain types for conversations and messages
//!
//! These types are owned by the conversation store; the chat core builds
//! them transiently to persist and to broadcast.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;

use crate::chat::{ConversationId, MessageId, UserId};

/// Conversation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationKind {
    /// One-to-one conversation, exactly two participants, fixed at creation
    Direct,
    /// Conversation attached to a project, membership may grow
    Project,
    /// Conversation attached to a team, membership may grow
    Team,
}

/// Error raised when a stored kind column carries an unknown value
#[derive(Debug, Error)]
#[error("unknown conversation kind '{0}'")]
pub struct UnknownConversationKind(String);

impl ConversationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Project => "project",
            Self::Team => "team",
        }
    }
}

impl FromStr for ConversationKind {
    type Err = UnknownConversationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "project" => Ok(Self::Project),
            "team" => Ok(Self::Team),
            other => Err(UnknownConversationKind(other.to_string())),
        }
    }
}

/// Error raised when a conversation record violates a structural invariant
#[derive(Debug, Error)]
#[error("direct conversation must have exactly two distinct participants, got {participant_count}")]
pub struct InvalidConversation {
    pub participant_count: usize,
}

/// A channel of messages among a set of participants
///
/// Conversations are created by the collaborator store, never by the chat
/// core; the core only looks them up for the connect-time membership check.
/// Participants are held in a `HashSet` so membership tests are O(1).
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub kind: ConversationKind,
    participants: HashSet<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Build a conversation, enforcing the direct-conversation invariant
    ///
    /// # Errors
    ///
    /// Returns `InvalidConversation` if `kind` is `Direct` and the
    /// participant set does not contain exactly two distinct users.
    pub fn new(
        id: ConversationId,
        kind: ConversationKind,
        participants: impl IntoIterator<Item = UserId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, InvalidConversation> {
        let participants: HashSet<UserId> = participants.into_iter().collect();
        if kind == ConversationKind::Direct && participants.len() != 2 {
            return Err(InvalidConversation {
                participant_count: participants.len(),
            });
        }
        Ok(Self {
            id,
            kind,
            participants,
            created_at,
            updated_at,
        })
    }

    /// O(1) membership test against the participant set
    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.participants.contains(&user_id)
    }

    pub fn participants(&self) -> impl Iterator<Item = UserId> + '_ {
        self.participants.iter().copied()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }
}

/// Media attached to a message
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDescriptor {
    pub url: String,
    pub mime_type: Option<String>,
    pub name: Option<String>,
}

/// A persisted chat message
///
/// The id and timestamp are assigned by the store. `read_at` stays `None`
/// until a recipient acknowledges the message via a read receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub media: Option<MediaDescriptor>,
    pub timestamp: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}
