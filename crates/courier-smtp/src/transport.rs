//! Authenticated SMTP transport sessions

use crate::{build_lettre_message, OutgoingMessage, SmtpError, SmtpResult};
use async_trait::async_trait;
use lettre::{
    message::Mailbox,
    transport::smtp::authentication::{Credentials, Mechanism},
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use tracing::{debug, info};

/// An authenticated session able to deliver messages
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver a message, waiting for the server to accept or reject it
    async fn send(&self, message: &OutgoingMessage) -> SmtpResult<()>;
}

/// Opens authenticated transport sessions
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// Open a session authenticated as `sender` with an OAuth2 access token
    async fn open(&self, sender: &str, access_token: &str) -> SmtpResult<Box<dyn MailTransport>>;
}

/// SMTP server address of a mail service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpService {
    pub host: String,
    pub port: u16,
}

impl SmtpService {
    /// Create a new service entry
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Gmail SMTP server
    pub fn gmail() -> Self {
        Self::new("smtp.gmail.com", 587)
    }

    /// Look up a well-known service by name
    ///
    /// Only Google services are known: the credentials are always issued by
    /// Google's token endpoint.
    pub fn well_known(name: &str) -> SmtpResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gmail" | "googlemail" => Ok(Self::gmail()),
            _ => Err(SmtpError::UnknownService(name.to_string())),
        }
    }
}

/// Opens a new XOAUTH2 SMTP transport per call
#[derive(Debug, Clone)]
pub struct SmtpConnector {
    service: SmtpService,
}

impl SmtpConnector {
    pub fn new(service: SmtpService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl TransportConnector for SmtpConnector {
    async fn open(&self, sender: &str, access_token: &str) -> SmtpResult<Box<dyn MailTransport>> {
        let sender_mailbox: Mailbox = sender
            .parse()
            .map_err(|e| SmtpError::InvalidAddress(format!("{}: {}", sender, e)))?;

        debug!(host = %self.service.host, port = self.service.port, "Opening SMTP transport");

        // lettre's Xoauth2 mechanism expects the access token directly -
        // it constructs and encodes the XOAUTH2 string internally
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.service.host)
            .map_err(|e| SmtpError::ConnectionFailed(e.to_string()))?
            .port(self.service.port)
            .credentials(Credentials::new(sender.to_string(), access_token.to_string()))
            .authentication(vec![Mechanism::Xoauth2])
            .build();

        Ok(Box::new(SmtpSession {
            transport,
            sender: sender_mailbox,
        }))
    }
}

/// A lettre transport bound to one sender
pub struct SmtpSession {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

#[async_trait]
impl MailTransport for SmtpSession {
    async fn send(&self, message: &OutgoingMessage) -> SmtpResult<()> {
        info!("Sending email via SMTP with XOAUTH2");

        let lettre_message = build_lettre_message(message, &self.sender)?;

        self.transport
            .send(lettre_message)
            .await
            .map_err(|e| SmtpError::SendFailed(e.to_string()))?;

        info!("Email sent successfully");
        Ok(())
    }
}
