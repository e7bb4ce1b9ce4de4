//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::error::FieldErrors;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Registration or password change input failed validation.
    #[error("invalid input: {0}")]
    Invalid(FieldErrors),

    /// A user with this email or username already exists.
    #[error("user with this {0} already exists")]
    AlreadyExists(String),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The current password given for a password change is wrong.
    #[error("current password is wrong")]
    WrongCurrentPassword,

    /// Token missing, unknown, or its user is gone.
    #[error("invalid token")]
    InvalidToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
