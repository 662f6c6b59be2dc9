//! Authentication Module
//!
//! The chat core consumes identity resolution through the `TokenVerifier`
//! trait; it never issues credentials itself. `tokens` provides the JWT
//! implementation used in production plus the `create_token` helper for
//! tests and operational tooling.

pub mod tokens;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use thiserror::Error;

use crate::chat::UserId;

pub use tokens::JwtVerifier;

/// Resolved identity attached to a connection for its lifetime
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

/// Errors raised while resolving an identity credential
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Resolves a bearer credential to a user identity
///
/// Called once per connection during the handshake; an error is fatal for
/// that connection and never retried server-side.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn resolve_identity(&self, credential: &str) -> Result<Identity, AuthError>;
}

/// Extract the identity credential for a WebSocket handshake
///
/// Accepts a standard `Authorization: Bearer <token>` header or a `token`
/// query parameter. The query parameter exists because browser WebSocket
/// clients cannot set arbitrary headers.
pub fn extract_credential(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }
    query_token
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}
