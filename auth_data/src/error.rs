use std::time::Duration;

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// Mongo server error code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum AuthDataError {
    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Token not found")]
    TokenNotFound,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("MongoDB error: {0}")]
    MongoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthDataError {
    /// Whether a retry of the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// True when the write failed on the unique index
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        _ => false,
    }
}

impl From<mongodb::error::Error> for AuthDataError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            return Self::DuplicateUsername;
        }

        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. } => Self::Unavailable(err.to_string()),
            _ => Self::MongoError(err.to_string()),
        }
    }
}

impl From<bson::ser::Error> for AuthDataError {
    fn from(err: bson::ser::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<bson::de::Error> for AuthDataError {
    fn from(err: bson::de::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_and_timeout_are_transient() {
        assert!(AuthDataError::Unavailable("down".into()).is_transient());
        assert!(AuthDataError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(!AuthDataError::DuplicateUsername.is_transient());
        assert!(!AuthDataError::MongoError("boom".into()).is_transient());
    }
}
