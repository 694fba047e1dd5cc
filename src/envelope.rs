//! Uniform response envelope shared by every operation

use auth_domain::AuthError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_UNPROCESSABLE: u16 = 422;
pub const STATUS_INTERNAL: u16 = 500;
pub const STATUS_UNAVAILABLE: u16 = 503;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub data: Value,
}

impl Envelope {
    /// Envelope for a failed operation; carries only public information
    pub fn failure(err: &AuthError) -> Self {
        Self {
            success: false,
            status_code: status_code(err),
            message: public_message(err),
            data: json!({ "error": error_kind(err) }),
        }
    }

    pub fn to_json(&self) -> String {
        // Envelope holds only strings, numbers and a JSON value
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// HTTP-style status for an error
pub fn status_code(err: &AuthError) -> u16 {
    match err {
        AuthError::Validation(_) => STATUS_UNPROCESSABLE,
        AuthError::DuplicateUser => STATUS_CONFLICT,
        AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::InvalidToken => {
            STATUS_UNAUTHORIZED
        }
        AuthError::TransientStore(_) => STATUS_UNAVAILABLE,
        AuthError::Internal(_) => STATUS_INTERNAL,
    }
}

/// Stable name of the error class
pub fn error_kind(err: &AuthError) -> &'static str {
    match err {
        AuthError::Validation(_) => "ValidationError",
        AuthError::DuplicateUser => "DuplicateUser",
        AuthError::InvalidCredentials => "InvalidCredentials",
        AuthError::MissingToken => "MissingToken",
        AuthError::InvalidToken => "InvalidToken",
        AuthError::TransientStore(_) => "TransientStoreError",
        AuthError::Internal(_) => "InternalError",
    }
}

pub fn public_message(err: &AuthError) -> String {
    match err {
        AuthError::Validation(reason) => reason.to_string(),
        AuthError::DuplicateUser => "Username already exists".to_string(),
        AuthError::InvalidCredentials => "Invalid credentials".to_string(),
        AuthError::MissingToken => "Authorization token is required".to_string(),
        AuthError::InvalidToken => "Invalid or expired token".to_string(),
        AuthError::TransientStore(_) => "Service temporarily unavailable".to_string(),
        AuthError::Internal(_) => "Internal server error".to_string(),
    }
}
