//! Outgoing message model and MIME rendering

use crate::{SmtpError, SmtpResult};
use lettre::{
    message::{
        header::{ContentType, HeaderName, HeaderValue},
        Attachment, Mailbox, MultiPart, SinglePart,
    },
    Message,
};

/// An attachment to include in an outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingAttachment {
    /// Filename to display
    pub filename: String,
    /// MIME type (e.g., "application/pdf")
    pub mime_type: String,
    /// Raw file data
    pub data: Vec<u8>,
    /// Content-ID for inline attachments referenced from the HTML body
    pub content_id: Option<String>,
}

/// Email message to send
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// From address, defaults to the authenticated sender
    pub from: Option<String>,
    /// To addresses
    pub to: Vec<String>,
    /// CC addresses
    pub cc: Vec<String>,
    /// BCC addresses
    pub bcc: Vec<String>,
    /// Reply-To address
    pub reply_to: Option<String>,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text_body: Option<String>,
    /// HTML body
    pub html_body: Option<String>,
    /// In-Reply-To header
    pub in_reply_to: Option<String>,
    /// References header
    pub references: Vec<String>,
    /// Extra raw headers
    pub headers: Vec<(String, String)>,
    /// File attachments
    pub attachments: Vec<OutgoingAttachment>,
}

impl OutgoingMessage {
    /// Create a new message builder
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }

    /// Override the From address
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    /// Add a To recipient
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to.push(address.into());
        self
    }

    /// Add a CC recipient
    pub fn cc(mut self, address: impl Into<String>) -> Self {
        self.cc.push(address.into());
        self
    }

    /// Add a BCC recipient
    pub fn bcc(mut self, address: impl Into<String>) -> Self {
        self.bcc.push(address.into());
        self
    }

    /// Set the Reply-To address
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    /// Set the plain text body
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.text_body = Some(body.into());
        self
    }

    /// Set the HTML body
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.html_body = Some(body.into());
        self
    }

    /// Set the In-Reply-To header
    pub fn reply_to_message(mut self, message_id: impl Into<String>) -> Self {
        self.in_reply_to = Some(message_id.into());
        self
    }

    /// Add a reference
    pub fn reference(mut self, message_id: impl Into<String>) -> Self {
        self.references.push(message_id.into());
        self
    }

    /// Add a raw header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add an attachment
    pub fn attachment(
        mut self,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        self.attachments.push(OutgoingAttachment {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
            content_id: None,
        });
        self
    }

    /// Add an inline attachment, referenced from HTML as `cid:<content_id>`
    pub fn inline_attachment(
        mut self,
        content_id: impl Into<String>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        self.attachments.push(OutgoingAttachment {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
            content_id: Some(content_id.into()),
        });
        self
    }

    /// Number of recipients across To, CC and BCC
    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }

    /// Check the message before any connection is made
    pub fn validate(&self) -> SmtpResult<()> {
        if self.recipient_count() == 0 {
            return Err(SmtpError::NoRecipients);
        }

        let addresses = self
            .from
            .iter()
            .chain(&self.to)
            .chain(&self.cc)
            .chain(&self.bcc)
            .chain(&self.reply_to);
        for address in addresses {
            parse_mailbox(address)?;
        }

        for (name, value) in &self.headers {
            header_value(name, value)?;
        }

        Ok(())
    }
}

fn parse_mailbox(address: &str) -> SmtpResult<Mailbox> {
    address
        .parse()
        .map_err(|e| SmtpError::InvalidAddress(format!("{}: {}", address, e)))
}

/// Headers set from typed fields or by the MIME builder
const RESERVED_HEADERS: &[&str] = &[
    "From",
    "Sender",
    "To",
    "Cc",
    "Bcc",
    "Reply-To",
    "Subject",
    "Date",
    "Message-ID",
    "In-Reply-To",
    "References",
    "MIME-Version",
    "Content-Type",
    "Content-Transfer-Encoding",
];

fn header_value(name: &str, value: &str) -> SmtpResult<HeaderValue> {
    if value.contains(['\r', '\n']) {
        return Err(SmtpError::InvalidHeader(format!(
            "{}: value contains a line break",
            name
        )));
    }
    // RFC 5322 field names: printable ASCII except colon
    if name.is_empty() || !name.bytes().all(|b| (33..=126).contains(&b) && b != b':') {
        return Err(SmtpError::InvalidHeader(format!("{}: invalid header name", name)));
    }
    if RESERVED_HEADERS.iter().any(|reserved| reserved.eq_ignore_ascii_case(name)) {
        return Err(SmtpError::InvalidHeader(format!("{}: set by the message builder", name)));
    }
    let header_name = HeaderName::new_from_ascii(name.to_string())
        .map_err(|_| SmtpError::InvalidHeader(format!("{}: invalid header name", name)))?;
    Ok(HeaderValue::new(header_name, value.to_string()))
}

/// Build a lettre Message, using `default_from` when the message has no From
pub fn build_lettre_message(msg: &OutgoingMessage, default_from: &Mailbox) -> SmtpResult<Message> {
    let from_mailbox = match msg.from {
        Some(ref from) => parse_mailbox(from)?,
        None => default_from.clone(),
    };

    let mut builder = Message::builder().from(from_mailbox).subject(&msg.subject);

    for to in &msg.to {
        builder = builder.to(parse_mailbox(to)?);
    }

    for cc in &msg.cc {
        builder = builder.cc(parse_mailbox(cc)?);
    }

    for bcc in &msg.bcc {
        builder = builder.bcc(parse_mailbox(bcc)?);
    }

    if let Some(ref reply_to) = msg.reply_to {
        builder = builder.reply_to(parse_mailbox(reply_to)?);
    }

    if let Some(ref in_reply_to) = msg.in_reply_to {
        builder = builder.in_reply_to(in_reply_to.clone());
    }

    if !msg.references.is_empty() {
        builder = builder.references(msg.references.join(" "));
    }

    for (name, value) in &msg.headers {
        builder = builder.raw_header(header_value(name, value)?);
    }

    // Build the body part (text/html or multipart/alternative)
    let body_part = match (&msg.text_body, &msg.html_body) {
        (Some(text), Some(html)) => MultiPart::alternative()
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(text.clone()),
            )
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(html.clone()),
            ),
        (Some(text), None) => MultiPart::alternative().singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(text.clone()),
        ),
        (None, Some(html)) => MultiPart::alternative().singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_HTML)
                .body(html.clone()),
        ),
        (None, None) => MultiPart::alternative().singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(String::new()),
        ),
    };

    // If there are attachments, wrap in multipart/mixed
    let message = if msg.attachments.is_empty() {
        builder
            .multipart(body_part)
            .map_err(|e| SmtpError::MessageBuildError(e.to_string()))?
    } else {
        let mut mixed = MultiPart::mixed().multipart(body_part);

        for att in &msg.attachments {
            let content_type = match att.mime_type.parse::<ContentType>() {
                Ok(content_type) => content_type,
                Err(_) => ContentType::parse("application/octet-stream")
                    .map_err(|e| SmtpError::MessageBuildError(e.to_string()))?,
            };

            let attachment = match att.content_id {
                Some(ref cid) => Attachment::new_inline(cid.clone()),
                None => Attachment::new(att.filename.clone()),
            };
            mixed = mixed.singlepart(attachment.body(att.data.clone(), content_type));
        }

        builder
            .multipart(mixed)
            .map_err(|e| SmtpError::MessageBuildError(e.to_string()))?
    };

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> Mailbox {
        "sender@gmail.com".parse().unwrap()
    }

    fn render(msg: &OutgoingMessage) -> String {
        let message = build_lettre_message(msg, &sender()).unwrap();
        String::from_utf8(message.formatted()).unwrap()
    }

    #[test]
    fn test_validate_requires_recipient() {
        let msg = OutgoingMessage::new("Hello").text("Hi");
        assert!(matches!(msg.validate(), Err(SmtpError::NoRecipients)));

        let msg = OutgoingMessage::new("Hello").bcc("hidden@example.com");
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_addresses() {
        let msg = OutgoingMessage::new("Hello").to("not-an-address");
        assert!(matches!(
            msg.validate(),
            Err(SmtpError::InvalidAddress(ref m)) if m.starts_with("not-an-address")
        ));

        let msg = OutgoingMessage::new("Hello").to("bob@example.com").reply_to("nope");
        assert!(matches!(msg.validate(), Err(SmtpError::InvalidAddress(_))));

        let msg = OutgoingMessage::new("Hello").to("Bob <bob@example.com>");
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_headers() {
        let msg = OutgoingMessage::new("Hello")
            .to("bob@example.com")
            .header("X-Bad Name", "value");
        assert!(matches!(msg.validate(), Err(SmtpError::InvalidHeader(_))));

        let msg = OutgoingMessage::new("Hello")
            .to("bob@example.com")
            .header("X-Campaign", "spring\r\nBcc: victim@example.com");
        assert!(matches!(msg.validate(), Err(SmtpError::InvalidHeader(_))));
    }

    #[test]
    fn test_validate_rejects_builder_headers() {
        for name in ["From", "content-type", "MESSAGE-ID", "Bcc", "mime-version"] {
            let msg = OutgoingMessage::new("Hello")
                .to("bob@example.com")
                .header(name, "ceo@bank.example");
            let rejected = matches!(
                msg.validate(),
                Err(SmtpError::InvalidHeader(ref m)) if m.starts_with(name)
            );
            assert!(rejected, "{} should be rejected", name);
        }
    }

    #[test]
    fn test_build_rejects_builder_headers() {
        let msg = OutgoingMessage::new("Hello")
            .to("bob@example.com")
            .header("From", "ceo@bank.example");
        assert!(matches!(
            build_lettre_message(&msg, &sender()),
            Err(SmtpError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_default_from_is_sender() {
        let rendered = render(&OutgoingMessage::new("Hello").to("bob@example.com").text("Hi Bob"));

        assert!(rendered.contains("From: sender@gmail.com"));
        assert!(rendered.contains("To: bob@example.com"));
        assert!(rendered.contains("Subject: Hello"));
        assert!(rendered.contains("text/plain"));
    }

    #[test]
    fn test_explicit_from_overrides_sender() {
        let rendered = render(
            &OutgoingMessage::new("Hello")
                .from("alias@example.com")
                .to("bob@example.com"),
        );
        assert!(rendered.contains("From: alias@example.com"));
        assert!(!rendered.contains("sender@gmail.com"));
    }

    #[test]
    fn test_text_and_html_are_alternatives() {
        let rendered = render(
            &OutgoingMessage::new("Hello")
                .to("bob@example.com")
                .text("Hi Bob")
                .html("<p>Hi Bob</p>"),
        );
        assert!(rendered.contains("multipart/alternative"));
        assert!(rendered.contains("text/plain"));
        assert!(rendered.contains("text/html"));
        assert!(!rendered.contains("multipart/mixed"));
    }

    #[test]
    fn test_attachments_use_mixed() {
        let rendered = render(
            &OutgoingMessage::new("Report")
                .to("bob@example.com")
                .html("<img src=\"cid:logo\">")
                .attachment("report.pdf", "application/pdf", b"%PDF-1.4".to_vec())
                .inline_attachment("logo", "logo.png", "image/png", vec![0x89, 0x50])
                .attachment("blob.bin", "not a mime type", vec![1, 2, 3]),
        );
        assert!(rendered.contains("multipart/mixed"));
        assert!(rendered.contains("report.pdf"));
        assert!(rendered.contains("application/pdf"));
        assert!(rendered.contains("Content-ID: <logo>"));
        assert!(rendered.contains("application/octet-stream"));
    }

    #[test]
    fn test_threading_and_custom_headers() {
        let rendered = render(
            &OutgoingMessage::new("Re: Hello")
                .to("bob@example.com")
                .reply_to_message("<abc@example.com>")
                .reference("<abc@example.com>")
                .header("X-Campaign", "spring"),
        );
        assert!(rendered.contains("In-Reply-To: <abc@example.com>"));
        assert!(rendered.contains("References: <abc@example.com>"));
        assert!(rendered.contains("X-Campaign: spring"));
    }

    #[test]
    fn test_envelope_includes_all_recipients() {
        let msg = OutgoingMessage::new("Hello")
            .to("a@example.com")
            .cc("b@example.com")
            .bcc("c@example.com");
        let message = build_lettre_message(&msg, &sender()).unwrap();
        assert_eq!(message.envelope().to().len(), 3);
    }
}
