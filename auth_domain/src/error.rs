use auth_data::AuthDataError;
use std::fmt;
use thiserror::Error;

/// Domain-specific authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Username already exists")]
    DuplicateUser,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token is missing")]
    MissingToken,

    #[error("Token is invalid")]
    InvalidToken,

    #[error("Store temporarily unavailable: {0}")]
    TransientStore(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthDataError> for AuthError {
    fn from(err: AuthDataError) -> Self {
        if err.is_transient() {
            return AuthError::TransientStore(err.to_string());
        }
        match err {
            AuthDataError::DuplicateUsername => AuthError::DuplicateUser,
            AuthDataError::TokenNotFound => AuthError::InvalidToken,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

/// Reasons a username or password is rejected before any store access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidUsername,
    EmptyPassword,
    PasswordTooShort,
    PasswordTooLong,
    PasswordInvalidCharacter,
    PasswordMissingDigit,
    PasswordMissingSymbol,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidUsername => write!(f, "Username must be a valid email address"),
            ValidationError::EmptyPassword => write!(f, "Password is required"),
            ValidationError::PasswordTooShort => write!(f, "Password is too short"),
            ValidationError::PasswordTooLong => write!(f, "Password is too long"),
            ValidationError::PasswordInvalidCharacter => {
                write!(f, "Password contains a character that is not allowed")
            }
            ValidationError::PasswordMissingDigit => write!(f, "Password must contain a digit"),
            ValidationError::PasswordMissingSymbol => write!(f, "Password must contain a symbol"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
