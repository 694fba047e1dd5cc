use crate::error::{AuthError, AuthResult};
use crate::models::{IssuedToken, SessionClaims, TokenState};
use async_trait::async_trait;
use auth_data::entities::TokenEntity;
use auth_data::repositories::TokenRepository;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Bytes of OS randomness behind each token id
const TOKEN_ID_BYTES: usize = 32;

pub struct TokenConfig {
    pub secret: String,
    pub audience: Vec<String>,
    pub issuer: String,
    pub algorithm: Algorithm,
    pub ttl: Duration,
}

impl TokenConfig {
    pub fn new(
        secret: String,
        audience: Vec<String>,
        issuer: String,
        algorithm: Algorithm,
        ttl: Duration,
    ) -> Self {
        Self {
            secret,
            audience,
            issuer,
            algorithm,
            ttl,
        }
    }
}

/// Token service for issuing, validating and revoking session tokens
#[async_trait]
pub trait TokenService: Send + Sync {
    /// Issue and persist a new session token for `subject`
    async fn issue(&self, subject: &str) -> AuthResult<IssuedToken>;

    /// Return the claims of a live token, `InvalidToken` otherwise
    async fn validate(&self, token: &str) -> AuthResult<SessionClaims>;

    /// Revoke a token.
    ///
    /// Revoking a token that is already revoked or expired is a no-op and
    /// yields `Ok(false)`; `Ok(true)` means this call performed the revocation.
    async fn revoke(&self, token: &str) -> AuthResult<bool>;

    /// Remove expired token records
    async fn purge_expired(&self) -> AuthResult<u64>;
}

pub struct JwtTokenService {
    config: TokenConfig,
    token_repository: Arc<dyn TokenRepository>,
}

impl JwtTokenService {
    pub fn new(config: TokenConfig, token_repository: Arc<dyn TokenRepository>) -> Self {
        Self {
            config,
            token_repository,
        }
    }

    fn generate_token_id() -> String {
        let mut bytes = [0u8; TOKEN_ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    fn encode<T>(&self, claims: &T) -> Result<String, AuthError>
    where
        T: Serialize,
    {
        let key = EncodingKey::from_secret(self.config.secret.as_bytes());
        encode(&Header::new(self.config.algorithm), &claims, &key)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {}", e)))
    }

    fn decode<T>(&self, token: &str, validate_exp: bool) -> Result<T, AuthError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let key = DecodingKey::from_secret(self.config.secret.as_bytes());
        let mut validation = Validation::new(self.config.algorithm);
        validation.leeway = 0;
        validation.validate_exp = validate_exp;
        validation.set_audience(&self.config.audience);
        validation.set_issuer(&[&self.config.issuer]);
        jsonwebtoken::decode::<T>(token, &key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                AuthError::InvalidToken
            })
    }

    async fn stored_record(&self, claims: &SessionClaims) -> AuthResult<TokenEntity> {
        let record = self
            .token_repository
            .find_token(&claims.jti)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if record.subject != claims.sub {
            return Err(AuthError::InvalidToken);
        }

        Ok(record)
    }
}

#[async_trait]
impl TokenService for JwtTokenService {
    async fn issue(&self, subject: &str) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.config.ttl).ok_or_else(|| {
            AuthError::Internal(format!("Token TTL {} overflows the clock", self.config.ttl))
        })?;
        let token_id = Self::generate_token_id();

        let claims = SessionClaims {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            jti: token_id.clone(),
        };
        let token = self.encode(&claims)?;

        let record = TokenEntity::new(token_id.clone(), subject.to_string(), now, expires_at);
        self.token_repository.insert_token(&record).await?;

        debug!("Issued token expiring at {}", expires_at);

        Ok(IssuedToken {
            token,
            token_id,
            subject: subject.to_string(),
            issued_at: now,
            expires_at,
        })
    }

    async fn validate(&self, token: &str) -> AuthResult<SessionClaims> {
        let claims: SessionClaims = self.decode(token, true)?;
        let record = self.stored_record(&claims).await?;

        match TokenState::of(&record, Utc::now()) {
            TokenState::Valid => Ok(claims),
            state => {
                debug!("Token is {}", state);
                Err(AuthError::InvalidToken)
            }
        }
    }

    async fn revoke(&self, token: &str) -> AuthResult<bool> {
        // Signature is still checked; an expired token resolves to a no-op below
        let claims: SessionClaims = self.decode(token, false)?;
        let record = self.stored_record(&claims).await?;

        let state = TokenState::of(&record, Utc::now());
        if state.is_terminal() {
            debug!("Token already {}, nothing to revoke", state);
            return Ok(false);
        }

        let revoked = self.token_repository.revoke_token(&claims.jti).await?;
        if revoked {
            info!("Token revoked for {}", claims.sub);
        }
        Ok(revoked)
    }

    async fn purge_expired(&self) -> AuthResult<u64> {
        let removed = self
            .token_repository
            .delete_expired_tokens(Utc::now())
            .await?;
        if removed > 0 {
            info!("Purged {} expired tokens", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_data::memory::InMemoryTokenRepository;

    fn config(ttl: Duration) -> TokenConfig {
        TokenConfig::new(
            "an-example-secret-that-is-long-enough".to_owned(),
            vec!["audience".to_owned()],
            "issuer".to_owned(),
            Algorithm::HS256,
            ttl,
        )
    }

    fn service_with(ttl: Duration) -> (JwtTokenService, Arc<InMemoryTokenRepository>) {
        let repo = Arc::new(InMemoryTokenRepository::new());
        (JwtTokenService::new(config(ttl), repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_issue_then_validate() {
        let (service, repo) = service_with(Duration::hours(1));

        let issued = service.issue("alice@example.com").await.unwrap();
        assert_eq!(issued.token_id.len(), TOKEN_ID_BYTES * 2);
        assert_eq!(issued.expires_at - issued.issued_at, Duration::hours(1));

        let claims = service.validate(&issued.token).await.unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.jti, issued.token_id);

        let record = repo.find_token(&issued.token_id).await.unwrap().unwrap();
        assert!(!record.revoked);
        assert_eq!(record.subject, "alice@example.com");
    }

    #[tokio::test]
    async fn test_token_ids_are_unique() {
        let (service, _) = service_with(Duration::hours(1));

        let a = service.issue("alice@example.com").await.unwrap();
        let b = service.issue("alice@example.com").await.unwrap();

        assert_ne!(a.token_id, b.token_id);
        assert_ne!(a.token, b.token);
    }

    #[tokio::test]
    async fn test_revoked_token_fails_validation() {
        let (service, _) = service_with(Duration::hours(1));
        let issued = service.issue("alice@example.com").await.unwrap();

        assert!(service.revoke(&issued.token).await.unwrap());
        assert!(matches!(
            service.validate(&issued.token).await,
            Err(AuthError::InvalidToken)
        ));

        // Revoking again is a no-op
        assert!(!service.revoke(&issued.token).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_token_fails_validation() {
        let (service, repo) = service_with(Duration::zero());
        let issued = service.issue("alice@example.com").await.unwrap();

        assert!(matches!(
            service.validate(&issued.token).await,
            Err(AuthError::InvalidToken)
        ));

        // Expired is terminal: revoke does not touch the record
        assert!(!service.revoke(&issued.token).await.unwrap());
        let record = repo.find_token(&issued.token_id).await.unwrap().unwrap();
        assert!(!record.revoked);
    }

    #[tokio::test]
    async fn test_unknown_and_forged_tokens_are_invalid() {
        let (service, _) = service_with(Duration::hours(1));
        let (other, _) = service_with(Duration::hours(1));

        // Signed correctly but never stored by this service
        let foreign = other.issue("alice@example.com").await.unwrap();
        assert!(matches!(
            service.validate(&foreign.token).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            service.revoke(&foreign.token).await,
            Err(AuthError::InvalidToken)
        ));

        let wrong_secret = JwtTokenService::new(
            TokenConfig::new(
                "a-different-secret-of-similar-length".to_owned(),
                vec!["audience".to_owned()],
                "issuer".to_owned(),
                Algorithm::HS256,
                Duration::hours(1),
            ),
            Arc::new(InMemoryTokenRepository::new()),
        );
        let forged = wrong_secret.issue("alice@example.com").await.unwrap();
        assert!(matches!(
            service.validate(&forged.token).await,
            Err(AuthError::InvalidToken)
        ));

        assert!(matches!(
            service.validate("not-a-token").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (service, repo) = service_with(Duration::seconds(-10));
        service.issue("alice@example.com").await.unwrap();
        service.issue("bob@example.com").await.unwrap();

        assert_eq!(service.purge_expired().await.unwrap(), 2);
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn test_overflowing_ttl_is_an_error() {
        let (service, repo) = service_with(Duration::seconds(10_000_000_000_000));

        assert!(matches!(
            service.issue("alice@example.com").await,
            Err(AuthError::Internal(_))
        ));
        assert_eq!(repo.len().await, 0);
    }
}
