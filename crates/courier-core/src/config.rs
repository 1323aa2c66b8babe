//! Mailer configuration
//!
//! Settings are clap arguments backed by environment variables, so the
//! same keys work as `--client-id` flags or as `CLIENT_ID` in the
//! environment.

use crate::ConfigError;
use clap::Parser;
use courier_auth::AccessTokenMode;
use std::ffi::{OsStr, OsString};

pub const CLIENT_ID: &str = "CLIENT_ID";
pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
pub const REFRESH_TOKEN: &str = "REFRESH_TOKEN";
pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
pub const EMAIL: &str = "EMAIL";
pub const MAIL_SERVICE: &str = "MAIL_SERVICE";
pub const TOKEN_MODE: &str = "TOKEN_MODE";

/// Raw mailer settings as read from flags or the environment
///
/// Values are kept as `OsString` until [`MailerSettings::into_config`]
/// checks them.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct MailerSettings {
    /// OAuth2 client id
    #[clap(long, env = CLIENT_ID, hide_env_values = true)]
    pub client_id: Option<OsString>,

    /// OAuth2 client secret
    #[clap(long, env = CLIENT_SECRET, hide_env_values = true)]
    pub client_secret: Option<OsString>,

    /// OAuth2 refresh token
    #[clap(long, env = REFRESH_TOKEN, hide_env_values = true)]
    pub refresh_token: Option<OsString>,

    /// OAuth2 access token
    #[clap(long, env = ACCESS_TOKEN, hide_env_values = true)]
    pub access_token: Option<OsString>,

    /// Sender address, also the SMTP login
    #[clap(long, env = EMAIL)]
    pub email: Option<OsString>,

    /// Well-known mail service (default: "gmail")
    #[clap(long, env = MAIL_SERVICE)]
    pub mail_service: Option<OsString>,

    /// "configured" uses ACCESS_TOKEN as is, "refresh" fetches a new one per send
    #[clap(long, env = TOKEN_MODE)]
    pub token_mode: Option<OsString>,
}

/// Flags-or-environment parser holding only the mailer settings
#[derive(Debug, Parser)]
#[clap(name = "courier")]
struct SettingsCommand {
    #[clap(flatten)]
    settings: MailerSettings,
}

/// Everything needed to authenticate and send mail
#[derive(Clone, PartialEq, Eq)]
pub struct MailerConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub access_token: String,
    /// Sender address
    pub email: String,
    /// Well-known service name, e.g. "gmail"
    pub service: String,
    pub token_mode: AccessTokenMode,
}

impl std::fmt::Debug for MailerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailerConfig")
            .field("client_id", &self.client_id)
            .field("email", &self.email)
            .field("service", &self.service)
            .field("token_mode", &self.token_mode)
            .finish_non_exhaustive()
    }
}

impl MailerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_args(["courier"])
    }

    /// Load configuration from command line style arguments, falling back
    /// to the environment for anything not given
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let command =
            SettingsCommand::try_parse_from(args).map_err(|e| ConfigError::Parse(e.to_string()))?;
        command.settings.into_config()
    }
}

impl MailerSettings {
    /// Check the settings and build a [`MailerConfig`]
    ///
    /// Blank values count as missing; values that are not UTF-8 are invalid.
    pub fn into_config(self) -> Result<MailerConfig, ConfigError> {
        let token_mode = match text(TOKEN_MODE, self.token_mode.as_deref())? {
            Some(value) => value
                .parse::<AccessTokenMode>()
                .map_err(|_| ConfigError::Invalid { key: TOKEN_MODE, value })?,
            None => AccessTokenMode::default(),
        };

        Ok(MailerConfig {
            client_id: required(CLIENT_ID, self.client_id.as_deref())?,
            client_secret: required(CLIENT_SECRET, self.client_secret.as_deref())?,
            refresh_token: required(REFRESH_TOKEN, self.refresh_token.as_deref())?,
            access_token: required(ACCESS_TOKEN, self.access_token.as_deref())?,
            email: required(EMAIL, self.email.as_deref())?,
            service: text(MAIL_SERVICE, self.mail_service.as_deref())?
                .unwrap_or_else(|| "gmail".to_string()),
            token_mode,
        })
    }
}

fn text(key: &'static str, value: Option<&OsStr>) -> Result<Option<String>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.to_str().ok_or_else(|| ConfigError::Invalid {
        key,
        value: value.to_string_lossy().into_owned(),
    })?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn required(key: &'static str, value: Option<&OsStr>) -> Result<String, ConfigError> {
    text(key, value)?.ok_or(ConfigError::Missing(key))
}
