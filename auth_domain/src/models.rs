use auth_data::entities::TokenEntity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

pub use crate::error::AuthResult;

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,      // Username
    pub exp: i64,         // Expiration timestamp
    pub iat: i64,         // Issued at timestamp
    pub iss: String,      // Issuer
    pub aud: Vec<String>, // Audience
    pub jti: String,      // Token id of the stored record
}

/// Public view of a stored credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSummary {
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A session token handed out on login
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: String,
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Lifecycle state of a stored token; `Expired` and `Revoked` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TokenState {
    Valid,
    Expired,
    Revoked,
}

impl TokenState {
    pub fn of(token: &TokenEntity, now: DateTime<Utc>) -> Self {
        if token.revoked {
            TokenState::Revoked
        } else if now >= token.expires_at {
            TokenState::Expired
        } else {
            TokenState::Valid
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, TokenState::Valid)
    }
}
