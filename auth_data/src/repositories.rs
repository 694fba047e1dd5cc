//! Repository implementations for credential and token storage

use crate::entities::{CredentialEntity, SaltedHash, TokenEntity};
use crate::error::AuthDataError;
use async_trait::async_trait;
use bson::doc;
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Default bound for a single store call
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Credential repository trait
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Create indexes the repository relies on
    async fn ensure_indexes(&self) -> Result<(), AuthDataError>;

    /// Insert a credential, failing with `DuplicateUsername` if the username exists
    async fn create_credential(
        &self,
        username: &str,
        salted_hash: SaltedHash,
    ) -> Result<CredentialEntity, AuthDataError>;

    /// Find a credential by its (normalized) username
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialEntity>, AuthDataError>;
}

/// Token repository trait
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Create indexes the repository relies on
    async fn ensure_indexes(&self) -> Result<(), AuthDataError>;

    /// Persist a freshly issued token
    async fn insert_token(&self, token: &TokenEntity) -> Result<(), AuthDataError>;

    /// Find a token by id
    async fn find_token(&self, token_id: &str) -> Result<Option<TokenEntity>, AuthDataError>;

    /// Flip `revoked` from false to true.
    ///
    /// Returns `Ok(true)` only for the call that performed the transition,
    /// `Ok(false)` when the token was already revoked, and `TokenNotFound`
    /// when no such token exists.
    async fn revoke_token(&self, token_id: &str) -> Result<bool, AuthDataError>;

    /// Delete tokens whose expiry is before `now`, returning how many were removed
    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, AuthDataError>;
}

/// Bound a store call, surfacing an elapsed deadline as `Timeout`
async fn timed<T, F>(limit: Duration, fut: F) -> Result<T, AuthDataError>
where
    F: Future<Output = Result<T, AuthDataError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Store call exceeded {:?}", limit);
            Err(AuthDataError::Timeout(limit))
        }
    }
}

/// MongoDB implementation of CredentialRepository
pub struct MongoCredentialRepository {
    db: Arc<RwLock<Database>>,
    collection_name: String,
    op_timeout: Duration,
}

impl MongoCredentialRepository {
    /// Create a new MongoDB credential repository
    pub fn new(db: Arc<RwLock<Database>>, collection_name: String, op_timeout: Duration) -> Self {
        Self {
            db,
            collection_name,
            op_timeout,
        }
    }

    /// Get the credentials collection
    async fn collection(&self) -> Collection<CredentialEntity> {
        self.db.read().await.collection(&self.collection_name)
    }
}

#[async_trait]
impl CredentialRepository for MongoCredentialRepository {
    async fn ensure_indexes(&self) -> Result<(), AuthDataError> {
        timed(self.op_timeout, async {
            let index = IndexModel::builder()
                .keys(doc! { "username": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();

            self.collection().await.create_index(index).await?;
            tracing::debug!("Unique username index ensured on {}", self.collection_name);
            Ok(())
        })
        .await
    }

    async fn create_credential(
        &self,
        username: &str,
        salted_hash: SaltedHash,
    ) -> Result<CredentialEntity, AuthDataError> {
        timed(self.op_timeout, async {
            let mut credential = CredentialEntity::new(username.to_string(), salted_hash);

            let collection = self.collection().await;
            let result = collection.insert_one(&credential).await?;
            credential.id = result.inserted_id.as_object_id();

            tracing::info!("Credential created for {}", credential.username);
            Ok(credential)
        })
        .await
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialEntity>, AuthDataError> {
        timed(self.op_timeout, async {
            let filter = doc! { "username": username };
            let coll = self.collection().await;
            let result = coll.find_one(filter).await?;
            Ok(result)
        })
        .await
    }
}

/// MongoDB implementation of TokenRepository
pub struct MongoTokenRepository {
    db: Arc<RwLock<Database>>,
    collection_name: String,
    op_timeout: Duration,
}

impl MongoTokenRepository {
    /// Create a new MongoDB token repository
    pub fn new(db: Arc<RwLock<Database>>, collection_name: String, op_timeout: Duration) -> Self {
        Self {
            db,
            collection_name,
            op_timeout,
        }
    }

    /// Get the tokens collection
    async fn collection(&self) -> Collection<TokenEntity> {
        self.db.read().await.collection(&self.collection_name)
    }
}

#[async_trait]
impl TokenRepository for MongoTokenRepository {
    async fn ensure_indexes(&self) -> Result<(), AuthDataError> {
        timed(self.op_timeout, async {
            let index = IndexModel::builder().keys(doc! { "expires_at": 1 }).build();
            self.collection().await.create_index(index).await?;
            Ok(())
        })
        .await
    }

    async fn insert_token(&self, token: &TokenEntity) -> Result<(), AuthDataError> {
        timed(self.op_timeout, async {
            self.collection().await.insert_one(token).await?;
            Ok(())
        })
        .await
    }

    async fn find_token(&self, token_id: &str) -> Result<Option<TokenEntity>, AuthDataError> {
        timed(self.op_timeout, async {
            let filter = doc! { "_id": token_id };
            let result = self.collection().await.find_one(filter).await?;
            Ok(result)
        })
        .await
    }

    async fn revoke_token(&self, token_id: &str) -> Result<bool, AuthDataError> {
        timed(self.op_timeout, async {
            let collection = self.collection().await;

            // Conditional on `revoked: false` so concurrent revokes have a single winner
            let filter = doc! { "_id": token_id, "revoked": false };
            let update = doc! {
                "$set": {
                    "revoked": true,
                    "revoked_at": bson::DateTime::now(),
                }
            };

            let result = collection.update_one(filter, update).await?;
            if result.modified_count == 1 {
                return Ok(true);
            }

            match collection.find_one(doc! { "_id": token_id }).await? {
                Some(_) => Ok(false),
                None => Err(AuthDataError::TokenNotFound),
            }
        })
        .await
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, AuthDataError> {
        timed(self.op_timeout, async {
            let filter = doc! {
                "expires_at": { "$lt": bson::DateTime::from_chrono(now) }
            };

            let result = self.collection().await.delete_many(filter).await?;
            Ok(result.deleted_count)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use mongodb::bson::Document;
    use mongodb::Client;
    use std::env;

    async fn setup_test_db() -> Arc<RwLock<Database>> {
        let mongo_uri = env::var("MONGO_DB_URI").expect("MONGO_DB_URI must be set");
        let client = Client::with_uri_str(&mongo_uri).await.unwrap();
        let db = client.database("test_auth_db");

        // Clean up test data
        db.collection::<Document>("test_credentials")
            .delete_many(doc! {})
            .await
            .unwrap();
        db.collection::<Document>("test_tokens")
            .delete_many(doc! {})
            .await
            .unwrap();

        Arc::new(RwLock::new(db))
    }

    fn salted_hash() -> SaltedHash {
        SaltedHash {
            hash: "aa".repeat(32),
            salt: "bb".repeat(32),
        }
    }

    #[tokio::test]
    async fn timed_call_reports_timeout() {
        let result: Result<(), AuthDataError> = timed(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(AuthDataError::Timeout(_))));
    }

    #[tokio::test]
    #[ignore = "requires MONGO_DB_URI"]
    async fn test_create_and_find_credential() {
        let db = setup_test_db().await;
        let repo = MongoCredentialRepository::new(
            db,
            "test_credentials".to_string(),
            DEFAULT_OP_TIMEOUT,
        );
        repo.ensure_indexes().await.unwrap();

        let created = repo
            .create_credential("carol@example.com", salted_hash())
            .await
            .unwrap();
        assert!(created.id.is_some());

        let found = repo
            .find_by_username("carol@example.com")
            .await
            .unwrap()
            .expect("credential should exist");
        assert_eq!(found.username, "carol@example.com");
        assert_eq!(found.salted_hash, salted_hash());

        let duplicate = repo
            .create_credential("carol@example.com", salted_hash())
            .await;
        assert!(matches!(duplicate, Err(AuthDataError::DuplicateUsername)));
    }

    #[tokio::test]
    #[ignore = "requires MONGO_DB_URI"]
    async fn test_revoke_and_purge_tokens() {
        let db = setup_test_db().await;
        let repo = MongoTokenRepository::new(db, "test_tokens".to_string(), DEFAULT_OP_TIMEOUT);

        let now = Utc::now();
        let live = TokenEntity::new(
            "live".to_string(),
            "dave@example.com".to_string(),
            now,
            now + ChronoDuration::hours(1),
        );
        let stale = TokenEntity::new(
            "stale".to_string(),
            "dave@example.com".to_string(),
            now - ChronoDuration::hours(2),
            now - ChronoDuration::hours(1),
        );
        repo.insert_token(&live).await.unwrap();
        repo.insert_token(&stale).await.unwrap();

        assert!(repo.revoke_token("live").await.unwrap());
        assert!(!repo.revoke_token("live").await.unwrap());
        assert!(matches!(
            repo.revoke_token("missing").await,
            Err(AuthDataError::TokenNotFound)
        ));

        assert_eq!(repo.delete_expired_tokens(now).await.unwrap(), 1);
        assert!(repo.find_token("stale").await.unwrap().is_none());
        assert!(repo.find_token("live").await.unwrap().unwrap().revoked);
    }
}
