//! Shop error types.

use store::StoreError;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Errors that can occur during shop operations.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Input failed validation; nothing was written.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Missing, invalid or expired credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Valid credentials without the required privilege.
    #[error("Forbidden")]
    Forbidden,

    /// A unique key is already taken.
    #[error("{0}")]
    Conflict(String),

    /// Store error.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// A token could not be issued.
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Password hashing failed.
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// The object store could not sign an upload.
    #[error("Upload error: {0}")]
    Upload(String),
}

impl ShopError {
    pub fn not_found(what: &str) -> Self {
        ShopError::NotFound(format!("{what} not found"))
    }
}

impl From<StoreError> for ShopError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(message) => ShopError::Conflict(message),
            StoreError::Domain(e) => ValidationErrors::single("items", e.to_string()).into(),
            other => ShopError::Store(other),
        }
    }
}

/// Convenience type alias for shop results.
pub type Result<T> = std::result::Result<T, ShopError>;
