//! Courier - send one email through an OAuth2-authenticated SMTP session
//!
//! Credentials are read from flags or the environment (CLIENT_ID,
//! CLIENT_SECRET, REFRESH_TOKEN, ACCESS_TOKEN, EMAIL). A `.env` file in the
//! working directory is loaded first.

use anyhow::Context;
use clap::Parser;
use courier_core::{message::OutgoingMessage, Mailer, MailerSettings};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[clap(name = "courier", about = "Send an email with OAuth2 SMTP credentials", version)]
struct Args {
    #[clap(flatten)]
    settings: MailerSettings,

    /// To recipient, repeatable
    #[clap(long, required = true)]
    to: Vec<String>,

    /// CC recipient, repeatable
    #[clap(long)]
    cc: Vec<String>,

    /// BCC recipient, repeatable
    #[clap(long)]
    bcc: Vec<String>,

    /// From address, defaults to EMAIL
    #[clap(long)]
    from: Option<String>,

    #[clap(long)]
    reply_to: Option<String>,

    #[clap(long)]
    subject: String,

    /// Plain text body
    #[clap(long)]
    text: Option<String>,

    /// HTML body
    #[clap(long)]
    html: Option<String>,

    /// File to attach, repeatable
    #[clap(long)]
    attach: Vec<PathBuf>,
}

impl Args {
    async fn into_message(self) -> anyhow::Result<OutgoingMessage> {
        let mut message = OutgoingMessage::new(self.subject);
        message.from = self.from;
        message.to = self.to;
        message.cc = self.cc;
        message.bcc = self.bcc;
        message.reply_to = self.reply_to;
        message.text_body = self.text;
        message.html_body = self.html;

        for path in self.attach {
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read attachment {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .with_context(|| format!("Attachment has no file name: {}", path.display()))?;
            message = message.attachment(filename, "application/octet-stream", data);
        }

        Ok(message)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("courier=debug".parse()?))
        .init();

    // A missing .env file is fine; the environment may already be set
    dotenvy::dotenv().ok();

    let mut args = Args::parse();

    let config = std::mem::take(&mut args.settings)
        .into_config()
        .context("Failed to load mail configuration")?;
    tracing::info!(sender = %config.email, service = %config.service, "Starting Courier");

    let mailer = Mailer::from_config(&config)?;
    let message = args.into_message().await?;

    mailer
        .send_email(&message)
        .await
        .context("Failed to send email")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_args_into_message() {
        let args = Args::parse_from([
            "courier",
            "--to",
            "bob@example.com",
            "--to",
            "carol@example.com",
            "--bcc",
            "audit@example.com",
            "--subject",
            "Hello",
            "--text",
            "Hi there",
        ]);

        let message = args.into_message().await.unwrap();
        assert_eq!(message.to, vec!["bob@example.com", "carol@example.com"]);
        assert_eq!(message.bcc, vec!["audit@example.com"]);
        assert_eq!(message.subject, "Hello");
        assert_eq!(message.text_body.as_deref(), Some("Hi there"));
        assert!(message.from.is_none());
        assert!(message.attachments.is_empty());
    }

    #[test]
    fn test_settings_flags_are_flattened() {
        let args = Args::parse_from([
            "courier",
            "--client-id",
            "client-id",
            "--client-secret",
            "client-secret",
            "--refresh-token",
            "1//refresh",
            "--access-token",
            "ya29.access",
            "--email",
            "sender@gmail.com",
            "--to",
            "bob@example.com",
            "--subject",
            "Hello",
        ]);

        let config = args.settings.into_config().unwrap();
        assert_eq!(config.email, "sender@gmail.com");
        assert_eq!(config.service, "gmail");
    }

    #[tokio::test]
    async fn test_missing_attachment_fails() {
        let args = Args::parse_from([
            "courier",
            "--to",
            "bob@example.com",
            "--subject",
            "Hello",
            "--attach",
            "/nonexistent/courier-attachment.bin",
        ]);

        assert!(args.into_message().await.is_err());
    }
}
