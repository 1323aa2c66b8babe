//! Error types for SMTP operations

use thiserror::Error;

/// Result type for SMTP operations
pub type SmtpResult<T> = Result<T, SmtpError>;

/// Errors that can occur during SMTP operations
#[derive(Debug, Error)]
pub enum SmtpError {
    /// Connection failed
    #[error("Failed to connect to SMTP server: {0}")]
    ConnectionFailed(String),

    /// Failed to send message
    #[error("Failed to send message: {0}")]
    SendFailed(String),

    /// Invalid email address
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Invalid custom header
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Message has no To, Cc or Bcc recipient
    #[error("No recipients defined")]
    NoRecipients,

    /// Service name is not a known mail provider
    #[error("Unknown mail service: {0}")]
    UnknownService(String),

    /// Message building error
    #[error("Failed to build message: {0}")]
    MessageBuildError(String),
}
