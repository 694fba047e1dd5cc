//! Database entities for authentication

use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use bson::Bson;
use bson::doc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored credential of a registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialEntity {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub salted_hash: SaltedHash,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl CredentialEntity {
    pub fn new(username: String, salted_hash: SaltedHash) -> Self {
        Self {
            id: None,
            username,
            salted_hash,
            created_at: Utc::now(),
        }
    }
}

/// Hex encoded password hash together with the salt it was derived with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaltedHash {
    pub hash: String,
    pub salt: String,
}

impl From<SaltedHash> for Bson {
    fn from(sh: SaltedHash) -> Bson {
        Bson::Document(doc! {
            "hash": sh.hash,
            "salt": sh.salt
        })
    }
}

/// Persisted record of an issued session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntity {
    #[serde(rename = "_id")]
    pub token_id: String,
    pub subject: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub issued_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<bson::DateTime>,
}

impl TokenEntity {
    pub fn new(
        token_id: String,
        subject: String,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token_id,
            subject,
            issued_at,
            expires_at,
            revoked: false,
            revoked_at: None,
        }
    }
}
