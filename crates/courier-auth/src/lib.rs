//! Authentication module for Courier
//!
//! Builds the OAuth2 credentials used to authenticate outgoing mail.
//! A fresh credential set is produced for every send.

mod client;
mod credentials;
mod error;

pub use client::{OAuth2Client, OAuth2Config, TokenPair};
#[cfg(feature = "mock")]
pub use credentials::MockCredentialProvider;
pub use credentials::{AccessTokenMode, CredentialProvider, CredentialSet, OAuth2CredentialProvider};
pub use error::{AuthError, AuthResult};

/// Gmail OAuth2 configuration
pub mod gmail {
    use super::OAuth2Config;

    /// Google authorization endpoint
    pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

    /// Google token endpoint
    pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

    /// Redirect URI of the OAuth2 playground, where the refresh token was issued
    pub const REDIRECT_URL: &str = "https://developers.google.com/oauthplayground";

    /// Create Gmail OAuth2 configuration
    pub fn oauth2_config(client_id: &str, client_secret: &str) -> OAuth2Config {
        OAuth2Config {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            redirect_url: REDIRECT_URL.to_string(),
        }
    }
}
