//! In-memory repositories used by tests of the crates built on top of this one

use crate::entities::{CredentialEntity, SaltedHash, TokenEntity};
use crate::error::AuthDataError;
use crate::repositories::{CredentialRepository, TokenRepository};
use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryCredentialRepository {
    credentials: RwLock<HashMap<String, CredentialEntity>>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.credentials.read().await.len()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn ensure_indexes(&self) -> Result<(), AuthDataError> {
        Ok(())
    }

    async fn create_credential(
        &self,
        username: &str,
        salted_hash: SaltedHash,
    ) -> Result<CredentialEntity, AuthDataError> {
        // Check and insert under one write guard
        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(username) {
            return Err(AuthDataError::DuplicateUsername);
        }

        let mut credential = CredentialEntity::new(username.to_string(), salted_hash);
        credential.id = Some(ObjectId::new());
        credentials.insert(username.to_string(), credential.clone());

        Ok(credential)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialEntity>, AuthDataError> {
        Ok(self.credentials.read().await.get(username).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryTokenRepository {
    tokens: RwLock<HashMap<String, TokenEntity>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn ensure_indexes(&self) -> Result<(), AuthDataError> {
        Ok(())
    }

    async fn insert_token(&self, token: &TokenEntity) -> Result<(), AuthDataError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.token_id) {
            return Err(AuthDataError::InternalError(format!(
                "Token id collision: {}",
                token.token_id
            )));
        }
        tokens.insert(token.token_id.clone(), token.clone());
        Ok(())
    }

    async fn find_token(&self, token_id: &str) -> Result<Option<TokenEntity>, AuthDataError> {
        Ok(self.tokens.read().await.get(token_id).cloned())
    }

    async fn revoke_token(&self, token_id: &str) -> Result<bool, AuthDataError> {
        let mut tokens = self.tokens.write().await;
        let token = tokens
            .get_mut(token_id)
            .ok_or(AuthDataError::TokenNotFound)?;

        if token.revoked {
            return Ok(false);
        }

        token.revoked = true;
        token.revoked_at = Some(bson::DateTime::now());
        Ok(true)
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, AuthDataError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| token.expires_at >= now);
        Ok((before - tokens.len()) as u64)
    }
}
