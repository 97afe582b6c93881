//! Auth error types.

use thiserror::Error;

/// Auth error type.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad username/password pair. Deliberately does not say which part.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username already registered.
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    /// Referenced user record is gone.
    #[error("user {0} not found")]
    UserNotFound(i64),

    /// Token signing/verification error.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Password hashing error.
    #[error("password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;
