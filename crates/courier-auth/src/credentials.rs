//! Per-send credential sets

use crate::{AuthError, AuthResult, OAuth2Client, OAuth2Config};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Credentials for a single send
///
/// A new set is built for every message; nothing here is cached.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSet {
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI handed to the OAuth2 client, never dereferenced
    pub redirect_url: String,
    pub refresh_token: String,
    pub access_token: String,
    /// Sender address, also the SMTP login
    pub sender: String,
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("redirect_url", &self.redirect_url)
            .field("refresh_token", &"[redacted]")
            .field("access_token", &"[redacted]")
            .field("sender", &self.sender)
            .finish()
    }
}

/// How the access token for a send is obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessTokenMode {
    /// Use the configured access token as is
    #[default]
    Configured,
    /// Exchange the refresh token for a fresh access token on every send
    Refresh,
}

impl FromStr for AccessTokenMode {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "configured" | "static" => Ok(AccessTokenMode::Configured),
            "refresh" => Ok(AccessTokenMode::Refresh),
            other => Err(AuthError::InvalidConfig(format!(
                "Unknown access token mode: {}",
                other
            ))),
        }
    }
}

/// Source of credentials for outgoing mail
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Build a fresh credential set
    async fn credentials(&self) -> AuthResult<CredentialSet>;
}

/// Builds credentials through an OAuth2 client on every call
#[derive(Clone)]
pub struct OAuth2CredentialProvider {
    config: OAuth2Config,
    refresh_token: String,
    access_token: String,
    sender: String,
    mode: AccessTokenMode,
}

impl OAuth2CredentialProvider {
    pub fn new(
        config: OAuth2Config,
        refresh_token: impl Into<String>,
        access_token: impl Into<String>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            config,
            refresh_token: refresh_token.into(),
            access_token: access_token.into(),
            sender: sender.into(),
            mode: AccessTokenMode::default(),
        }
    }

    /// Set how the access token is obtained
    pub fn mode(mut self, mode: AccessTokenMode) -> Self {
        self.mode = mode;
        self
    }
}

#[async_trait]
impl CredentialProvider for OAuth2CredentialProvider {
    async fn credentials(&self) -> AuthResult<CredentialSet> {
        let client = OAuth2Client::new(&self.config)?.with_refresh_token(&self.refresh_token);

        let (access_token, refresh_token) = match self.mode {
            AccessTokenMode::Configured => (self.access_token.clone(), self.refresh_token.clone()),
            AccessTokenMode::Refresh => {
                let tokens = client.refresh().await?;
                debug!(expires_at = ?tokens.expires_at, "Refreshed access token");
                (tokens.access_token, tokens.refresh_token)
            }
        };

        Ok(CredentialSet {
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
            redirect_url: self.config.redirect_url.clone(),
            refresh_token,
            access_token,
            sender: self.sender.clone(),
        })
    }
}
