pub mod error;
pub mod service;
pub mod models;
pub mod token_service;
mod mappers;
pub mod hashing_service;
mod utils;
pub mod password_policy;

pub use error::{AuthError, ValidationError};
pub use service::{AuthService, AuthServiceImpl};
pub use models::{AuthResult, CredentialSummary, IssuedToken, TokenState};
pub use token_service::TokenService;
pub use password_policy::PasswordPolicy;
