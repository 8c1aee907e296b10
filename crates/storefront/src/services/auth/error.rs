//! Authentication error types.

use thiserror::Error;

use furnish_core::account::{LoginFormError, RegistrationError};

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Registration form failed validation.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Login form failed validation.
    #[error(transparent)]
    LoginForm(#[from] LoginFormError),

    /// Invalid credentials (wrong password or user not found).
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// An account already uses this email.
    #[error("Email already registered")]
    EmailTaken,

    /// An account already uses this username.
    #[error("Username already taken")]
    UsernameTaken,

    /// Bearer token missing, unknown or expired.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token row exists but its user is gone.
    #[error("user not found")]
    UserNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
