//! Mail dispatcher
//!
//! Every call builds its own credentials and transport session; nothing
//! is shared between sends except the immutable collaborators.

use crate::{DispatchResult, MailerConfig};
use courier_auth::{gmail, CredentialProvider, OAuth2CredentialProvider};
use courier_smtp::{OutgoingMessage, SmtpConnector, SmtpService, TransportConnector};
use tracing::{debug, info};

/// Sends email through an authenticated transport
pub struct Mailer<P, C> {
    credentials: P,
    connector: C,
}

impl<P, C> Mailer<P, C>
where
    P: CredentialProvider,
    C: TransportConnector,
{
    /// Create a mailer from explicit collaborators
    pub fn new(credentials: P, connector: C) -> Self {
        Self {
            credentials,
            connector,
        }
    }

    /// Send one email
    ///
    /// A single attempt: errors from the credential provider or the
    /// transport are returned as they were raised.
    pub async fn send_email(&self, message: &OutgoingMessage) -> DispatchResult<()> {
        message.validate()?;

        info!(
            recipients = message.recipient_count(),
            attachments = message.attachments.len(),
            "Dispatching email"
        );

        let credentials = self.credentials.credentials().await?;
        debug!(sender = %credentials.sender, "Built credentials");

        let transport = self
            .connector
            .open(&credentials.sender, &credentials.access_token)
            .await?;
        debug!("Opened transport session");

        transport.send(message).await?;

        info!("Email dispatched");
        Ok(())
    }
}

impl Mailer<OAuth2CredentialProvider, SmtpConnector> {
    /// Wire the OAuth2 credential provider and the SMTP connector
    pub fn from_config(config: &MailerConfig) -> DispatchResult<Self> {
        let service = SmtpService::well_known(&config.service)?;

        let credentials = OAuth2CredentialProvider::new(
            gmail::oauth2_config(&config.client_id, &config.client_secret),
            &config.refresh_token,
            &config.access_token,
            &config.email,
        )
        .mode(config.token_mode);

        Ok(Self::new(credentials, SmtpConnector::new(service)))
    }
}
