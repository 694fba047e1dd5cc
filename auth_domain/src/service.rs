use crate::error::{AuthError, ValidationError};
use crate::hashing_service::HashingService;
use crate::mappers::credential_entity_to_summary;
use crate::models::{AuthResult, CredentialSummary, IssuedToken};
use crate::password_policy::PasswordPolicy;
use crate::utils::{is_valid_email, normalize_username};
use crate::TokenService;
use async_trait::async_trait;
use auth_data::entities::SaltedHash;
use auth_data::repositories::CredentialRepository;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Auth service trait defining authentication operations
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new credential
    async fn register(&self, username: &str, password: &str) -> AuthResult<CredentialSummary>;

    /// Log in and receive a session token
    async fn login(&self, username: &str, password: &str) -> AuthResult<IssuedToken>;

    /// Revoke the presented session token
    async fn logout(&self, session_token: &str) -> AuthResult<()>;

    /// Validate session token, returning its subject
    async fn validate_token(&self, session_token: &str) -> AuthResult<String>;
}

/// Implementation of AuthService
pub struct AuthServiceImpl {
    credential_repository: Arc<dyn CredentialRepository>,
    token_service: Arc<dyn TokenService>,
    hashing_service: Arc<dyn HashingService>,
    password_policy: PasswordPolicy,
    // Verified against when the username is unknown so both failure paths cost the same
    decoy_hash: SaltedHash,
}

impl AuthServiceImpl {
    /// Create a new auth service instance
    pub fn new(
        credential_repository: Arc<dyn CredentialRepository>,
        token_service: Arc<dyn TokenService>,
        hashing_service: Arc<dyn HashingService>,
        password_policy: PasswordPolicy,
    ) -> Self {
        let decoy_hash = hashing_service.hash_password("decoy-password");
        Self {
            credential_repository,
            token_service,
            hashing_service,
            password_policy,
            decoy_hash,
        }
    }

    fn check_username(&self, username: &str) -> Result<String, ValidationError> {
        let username = normalize_username(username);
        if !is_valid_email(&username) {
            return Err(ValidationError::InvalidUsername);
        }
        Ok(username)
    }

    fn log_store_failure(operation: &str, err: &AuthError) {
        match err {
            AuthError::TransientStore(_) => warn!("{} failed, store unavailable: {}", operation, err),
            AuthError::Internal(_) => error!("{} failed: {}", operation, err),
            _ => {}
        }
    }

    /// Runs `f` against the hashing service on the blocking pool
    async fn with_hasher<T, F>(&self, f: F) -> AuthResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn HashingService) -> T + Send + 'static,
    {
        let hashing_service = self.hashing_service.clone();
        tokio::task::spawn_blocking(move || f(hashing_service.as_ref()))
            .await
            .map_err(|e| {
                error!("Hashing task failed: {}", e);
                AuthError::Internal(e.to_string())
            })
    }

    fn require_token(session_token: &str) -> AuthResult<&str> {
        let session_token = session_token.trim();
        if session_token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        Ok(session_token)
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(&self, username: &str, password: &str) -> AuthResult<CredentialSummary> {
        let username = self.check_username(username)?;
        self.password_policy.check(password)?;

        let password = password.to_owned();
        let salted_hash = self
            .with_hasher(move |hasher| hasher.hash_password(&password))
            .await?;

        let credential = self
            .credential_repository
            .create_credential(&username, salted_hash)
            .await
            .map_err(|e| {
                let err = AuthError::from(e);
                Self::log_store_failure("Registration", &err);
                err
            })?;

        info!("Registered {}", credential.username);
        Ok(credential_entity_to_summary(credential))
    }

    async fn login(&self, username: &str, password: &str) -> AuthResult<IssuedToken> {
        let username = self.check_username(username)?;
        self.password_policy.check_presented(password)?;

        let credential = self
            .credential_repository
            .find_by_username(&username)
            .await
            .map_err(|e| {
                let err = AuthError::from(e);
                Self::log_store_failure("Credential lookup", &err);
                err
            })?;

        let known = credential.is_some();
        let salted_hash = credential
            .map(|credential| credential.salted_hash)
            .unwrap_or_else(|| self.decoy_hash.clone());
        let password = password.to_owned();
        let matches = self
            .with_hasher(move |hasher| hasher.verify(&password, &salted_hash))
            .await?;
        let valid = known && matches;

        if !valid {
            info!("Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.token_service.issue(&username).await.map_err(|e| {
            Self::log_store_failure("Token issue", &e);
            e
        })?;

        info!("{} logged in", username);
        Ok(issued)
    }

    async fn logout(&self, session_token: &str) -> AuthResult<()> {
        let session_token = Self::require_token(session_token)?;

        let claims = self.token_service.validate(session_token).await?;

        // A concurrent logout may have revoked it between validate and revoke
        let revoked = self.token_service.revoke(session_token).await.map_err(|e| {
            Self::log_store_failure("Logout", &e);
            e
        })?;
        if !revoked {
            return Err(AuthError::InvalidToken);
        }

        info!("{} logged out", claims.sub);
        Ok(())
    }

    async fn validate_token(&self, session_token: &str) -> AuthResult<String> {
        let session_token = Self::require_token(session_token)?;
        let claims = self.token_service.validate(session_token).await?;
        Ok(claims.sub)
    }
}
