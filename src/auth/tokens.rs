/**
 * JWT Tokens
 *
 * This module handles JWT token generation and validation for chat
 * connections. Tokens are issued by the platform's auth service; the chat
 * server only verifies them, but `create_token` is kept for tests and
 * operational tooling.
 */

use async_trait::async_trait;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::{AuthError, Identity, TokenVerifier};
use crate::chat::UserId;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Display name carried into typing frames
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

/// Create a JWT token for a user
///
/// Token expires in 30 days.
pub fn create_token(
    user_id: UserId,
    username: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = unix_now();
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp: now + (30 * 24 * 60 * 60),
        iat: now,
    };
    let key = EncodingKey::from_secret(secret.as_ref());
    encode(&Header::default(), &claims, &key)
}

/// Verify and decode a JWT token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(secret.as_ref());
    let validation = Validation::default();
    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(token_data.claims)
}

/// HS256 verifier over a shared secret
pub struct JwtVerifier {
    secret: String,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Build from the `JWT_SECRET` environment variable
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using development default");
            "your-secret-key-change-in-production".to_string()
        });
        Self::new(secret)
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn resolve_identity(&self, credential: &str) -> Result<Identity, AuthError> {
        let claims = verify_token(credential, &self.secret)
            .map_err(|error| AuthError::InvalidToken(error.to_string()))?;
        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken(format!("non-numeric subject '{}'", claims.sub)))?;
        Ok(Identity {
            user_id,
            username: claims.username,
        })
    }
}
