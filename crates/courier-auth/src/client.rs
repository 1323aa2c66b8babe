//! OAuth2 client for refresh-token based credentials
//!
//! Wraps the `oauth2` crate's `BasicClient`. The client is configured with a
//! client id, client secret and redirect URI, and a refresh token can be
//! attached to it for exchanging a fresh access token.

use crate::{AuthError, AuthResult};
use oauth2::{
    basic::BasicClient, AuthUrl, ClientId, ClientSecret, RedirectUrl, RefreshToken,
    TokenResponse, TokenUrl,
};
use tracing::debug;

/// OAuth2 provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2Config {
    /// OAuth2 client ID
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: String,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Redirect URI registered with the provider
    pub redirect_url: String,
}

/// Token pair returned by a refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Access token for API calls
    pub access_token: String,
    /// Refresh token, rotated or the one that was exchanged
    pub refresh_token: String,
    /// Token expiration timestamp (Unix seconds)
    pub expires_at: Option<i64>,
}

/// An OAuth2 client with an optional refresh token attached
pub struct OAuth2Client {
    client: BasicClient,
    refresh_token: Option<RefreshToken>,
}

impl OAuth2Client {
    /// Create a new client, validating the configured endpoints
    pub fn new(config: &OAuth2Config) -> AuthResult<Self> {
        let client_id = ClientId::new(config.client_id.clone());
        let client_secret = ClientSecret::new(config.client_secret.clone());
        let auth_url = AuthUrl::new(config.auth_url.clone())
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(config.redirect_url.clone())
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid redirect URL: {}", e)))?;

        let client = BasicClient::new(client_id, Some(client_secret), auth_url, Some(token_url))
            .set_redirect_uri(redirect_url);

        Ok(Self {
            client,
            refresh_token: None,
        })
    }

    /// Attach the refresh token used by [`OAuth2Client::refresh`]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(RefreshToken::new(refresh_token.into()));
        self
    }

    /// Exchange the attached refresh token for a new access token
    pub async fn refresh(&self) -> AuthResult<TokenPair> {
        let refresh_token = self
            .refresh_token
            .as_ref()
            .ok_or_else(|| AuthError::TokenNotFound("refresh token".to_string()))?;

        debug!("Exchanging refresh token for a new access token");

        let token_response = self
            .client
            .exchange_refresh_token(refresh_token)
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(error_chain(&e)))?;

        let expires_at = token_response.expires_in().map(|duration| {
            chrono::Utc::now().timestamp() + duration.as_secs() as i64
        });

        // Providers only return a refresh token when they rotate it
        Ok(TokenPair {
            access_token: token_response.access_token().secret().clone(),
            refresh_token: token_response
                .refresh_token()
                .unwrap_or(refresh_token)
                .secret()
                .clone(),
            expires_at,
        })
    }
}

/// Render an error with its sources, e.g. "Request failed: connection refused"
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OAuth2Config {
        crate::gmail::oauth2_config("client-id", "client-secret")
    }

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Request failed")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_error_chain_keeps_cause() {
        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(error_chain(&err), "Request failed: connection refused");
    }

    #[test]
    fn test_client_accepts_gmail_config() {
        assert!(OAuth2Client::new(&config()).is_ok());
    }

    #[test]
    fn test_client_rejects_invalid_urls() {
        let mut bad = config();
        bad.token_url = "not a url".to_string();
        let Err(err) = OAuth2Client::new(&bad) else {
            panic!("token URL should be rejected");
        };
        assert!(matches!(
            err,
            AuthError::InvalidConfig(ref m) if m.starts_with("Invalid token URL")
        ));

        let mut bad = config();
        bad.redirect_url = String::new();
        let Err(err) = OAuth2Client::new(&bad) else {
            panic!("redirect URL should be rejected");
        };
        assert!(matches!(
            err,
            AuthError::InvalidConfig(ref m) if m.starts_with("Invalid redirect URL")
        ));
    }

    #[tokio::test]
    async fn test_refresh_without_token() {
        let client = OAuth2Client::new(&config()).unwrap();
        let err = client.refresh().await.unwrap_err();
        assert!(matches!(err, AuthError::TokenNotFound(_)));
    }

    #[tokio::test]
    async fn test_refresh_against_unreachable_endpoint() {
        let mut unreachable = config();
        unreachable.token_url = "http://127.0.0.1:1/token".to_string();
        let client = OAuth2Client::new(&unreachable)
            .unwrap()
            .with_refresh_token("1//refresh");

        let err = client.refresh().await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::TokenExchangeFailed(ref m) if m.starts_with("Request failed")
        ));
    }
}
