//! Authentication error types.

use ruway_core::checkout::ValidationErrors;
use thiserror::Error;

use crate::baas::BaasError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] ruway_core::EmailError),

    /// Registration details failed validation.
    #[error("registration details are invalid: {0}")]
    Validation(#[from] ValidationErrors),

    /// Invalid credentials (wrong password or unknown user).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// The email is reserved and cannot be registered.
    #[error("email is not available for registration")]
    EmailUnavailable,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// The backend answered without a session or user.
    #[error("incomplete auth response: {0}")]
    IncompleteResponse(&'static str),

    /// Supabase request failed.
    #[error("backend error: {0}")]
    Baas(#[from] BaasError),
}
