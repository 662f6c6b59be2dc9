/**
 * Chat Server Error Types
 *
 * This module defines the error taxonomy for the chat core. Each variant
 * maps to a distinct failure policy in the connection handler:
 *
 * - `Auth` - identity could not be resolved; fatal for the connection,
 *   closed with WebSocket code 1008 (policy violation), never retried.
 * - `Forbidden` - valid identity but not a participant; fatal, closed
 *   with code 1003.
 * - `MalformedFrame` - inbound JSON missing required fields or carrying
 *   an unknown type; non-fatal, the single frame is logged and dropped.
 * - `Store` - a persistence call failed; the triggering frame's side
 *   effects are abandoned but the connection stays open.
 * - `Delivery` - a send to one peer socket failed; isolated per
 *   recipient, triggers reaping of that socket only.
 */

use axum::extract::ws::close_code;
use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::chat::store::StoreError;
use crate::chat::{ConversationId, UserId};

#[derive(Debug, Error)]
pub enum ChatError {
    /// Identity credential missing or unresolvable
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Authenticated user is not a participant of the target conversation
    #[error("user {user_id} is not a participant of conversation {conversation_id}")]
    Forbidden {
        conversation_id: ConversationId,
        user_id: UserId,
    },

    /// Inbound frame could not be interpreted
    #[error("malformed frame: {message}")]
    MalformedFrame { message: String },

    /// The conversation store rejected or failed an operation
    #[error(transparent)]
    Store(#[from] StoreError),

    /// One peer socket could not accept a frame
    #[error("delivery failed for socket {socket_id}")]
    Delivery { socket_id: Uuid },
}

impl ChatError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            message: message.into(),
        }
    }

    /// HTTP status for surfacing this error outside a WebSocket
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::MalformedFrame { .. } => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Delivery { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// WebSocket close code when this error is fatal for a connection
    ///
    /// `None` means the error does not close the connection.
    pub fn close_code(&self) -> Option<u16> {
        match self {
            Self::Auth(_) => Some(close_code::POLICY),
            Self::Forbidden { .. } => Some(close_code::UNSUPPORTED),
            _ => None,
        }
    }
}
