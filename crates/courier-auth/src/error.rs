//! Error types for the auth module

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur while building credentials
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token of the requested kind is available
    #[error("Token not found: {0}")]
    TokenNotFound(String),

    /// Token exchange with the provider failed
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
