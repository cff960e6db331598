//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] cartwheel_core::UsernameError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid username or password")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("username already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// No `Authorization` header on a request that needs one.
    #[error("authorization header is required")]
    MissingToken,

    /// `Authorization` header present but not `Bearer <token>`.
    #[error("authorization header format must be Bearer {{token}}")]
    InvalidAuthScheme,

    /// The token is not a well-formed JWT.
    #[error("malformed token")]
    MalformedToken,

    /// The token's `exp` has passed.
    #[error("token has expired")]
    ExpiredToken,

    /// Signature or claims did not verify.
    #[error("invalid token")]
    InvalidToken,

    /// Signing a new token failed.
    #[error("failed to issue token")]
    TokenIssue,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
