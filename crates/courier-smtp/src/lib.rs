//! SMTP implementation for Courier
//!
//! Provides the outgoing message model and an SMTP transport that
//! authenticates with XOAUTH2.

mod error;
mod message;
mod transport;

pub use error::{SmtpError, SmtpResult};
pub use message::{build_lettre_message, OutgoingAttachment, OutgoingMessage};
#[cfg(feature = "mock")]
pub use transport::{MockMailTransport, MockTransportConnector};
pub use transport::{MailTransport, SmtpConnector, SmtpService, SmtpSession, TransportConnector};
