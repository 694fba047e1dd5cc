//! Data layer for authentication feature
//!
//! This module contains the data access layer for the authentication feature,
//! including database entities, repositories, and data-specific error messages.

pub mod entities;
pub mod repositories;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use entities::*;
pub use repositories::*;
pub use error::*;
