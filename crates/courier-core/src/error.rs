//! Error types for the core module

use thiserror::Error;

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors raised while loading configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Required key is absent or blank
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    /// Key is present but its value is not accepted
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    /// Settings could not be parsed at all
    #[error("Failed to parse settings: {0}")]
    Parse(String),
}

/// Errors that can occur while dispatching an email
///
/// Collaborator errors are carried unchanged.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] courier_auth::AuthError),

    #[error(transparent)]
    Smtp(#[from] courier_smtp::SmtpError),
}
