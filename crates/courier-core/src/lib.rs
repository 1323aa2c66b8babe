//! Core dispatch logic for Courier
//!
//! Loads configuration and sends email through the auth and SMTP crates.

pub mod config;
mod error;
mod mailer;

pub use config::{MailerConfig, MailerSettings};
pub use error::{ConfigError, DispatchError, DispatchResult};
pub use mailer::Mailer;

/// Re-export message types for convenience
pub mod message {
    pub use courier_smtp::{OutgoingAttachment, OutgoingMessage};
}
