//! Outbound mail relays: the host's `sendmail` binary or an SMTP server.

use std::sync::Arc;

use async_trait::async_trait;
use clearaway_core::config::{MailConfig, MailRelayKind};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{
    AsyncSendmailTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use thiserror::Error;

const DEFAULT_SENDMAIL_COMMAND: &str = "sendmail";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid mail address `{address}`: {reason}")]
    Address { address: String, reason: String },
    #[error("could not build email: {0}")]
    Build(String),
    #[error("mail relay failed: {0}")]
    Transport(String),
    #[error("mail relay is misconfigured: {0}")]
    Configuration(String),
}

/// A decoded image ready to attach.
#[derive(Clone, Debug)]
pub struct MailAttachment {
    pub name: String,
    pub content_type: ContentType,
    pub content: Vec<u8>,
}

/// A rendered quote email, independent of how it is relayed.
#[derive(Clone, Debug)]
pub struct QuoteEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub reply_to: Option<String>,
    pub html: String,
    pub attachments: Vec<MailAttachment>,
}

impl QuoteEmail {
    pub fn to_message(&self) -> Result<Message, RelayError> {
        let mut builder = Message::builder()
            .from(mailbox(&self.from)?)
            .to(mailbox(&self.to)?)
            .subject(self.subject.clone());
        // Contact may be a phone number; only a parseable address becomes Reply-To.
        if let Some(reply_to) = self.reply_to.as_deref().and_then(|value| value.parse().ok()) {
            builder = builder.reply_to(reply_to);
        }

        let mut body = MultiPart::mixed().singlepart(SinglePart::html(self.html.clone()));
        for attachment in &self.attachments {
            body = body.singlepart(
                Attachment::new(attachment.name.clone())
                    .body(attachment.content.clone(), attachment.content_type.clone()),
            );
        }

        builder.multipart(body).map_err(|error| RelayError::Build(error.to_string()))
    }
}

fn mailbox(address: &str) -> Result<Mailbox, RelayError> {
    address.parse().map_err(|error: lettre::address::AddressError| RelayError::Address {
        address: address.to_string(),
        reason: error.to_string(),
    })
}

#[async_trait]
pub trait MailRelay: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(detail)` when the relay looks usable, `Err(detail)` otherwise.
    async fn readiness(&self) -> Result<String, String>;

    async fn send(&self, email: &QuoteEmail) -> Result<(), RelayError>;
}

pub struct SendmailRelay {
    command: String,
    transport: AsyncSendmailTransport<Tokio1Executor>,
}

impl SendmailRelay {
    pub fn new(command: Option<&str>) -> Self {
        let command = command.unwrap_or(DEFAULT_SENDMAIL_COMMAND).to_string();
        let transport = AsyncSendmailTransport::<Tokio1Executor>::new_with_command(command.clone());
        Self { command, transport }
    }
}

#[async_trait]
impl MailRelay for SendmailRelay {
    fn name(&self) -> &'static str {
        "sendmail"
    }

    async fn readiness(&self) -> Result<String, String> {
        which::which(&self.command)
            .map(|path| format!("sendmail found at {}", path.display()))
            .map_err(|error| format!("sendmail command `{}` not found: {error}", self.command))
    }

    async fn send(&self, email: &QuoteEmail) -> Result<(), RelayError> {
        let message = email.to_message()?;
        self.transport.send(message).await.map_err(|error| RelayError::Transport(error.to_string()))
    }
}

pub struct SmtpRelay {
    host: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpRelay {
    pub fn new(config: &MailConfig) -> Result<Self, RelayError> {
        let host = config
            .smtp_host
            .clone()
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| RelayError::Configuration("mail.smtp_host is required".to_string()))?;

        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
        }
        .map_err(|error| RelayError::Configuration(error.to_string()))?
        .port(config.smtp_port);

        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) => builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            )),
            _ => builder,
        };

        Ok(Self { host, transport: builder.build() })
    }
}

#[async_trait]
impl MailRelay for SmtpRelay {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn readiness(&self) -> Result<String, String> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(format!("smtp relay {} reachable", self.host)),
            Ok(false) => Err(format!("smtp relay {} refused the connection test", self.host)),
            Err(error) => Err(format!("smtp relay {} unreachable: {error}", self.host)),
        }
    }

    async fn send(&self, email: &QuoteEmail) -> Result<(), RelayError> {
        let message = email.to_message()?;
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|error| RelayError::Transport(error.to_string()))
    }
}

pub fn build_relay(config: &MailConfig) -> Result<Arc<dyn MailRelay>, RelayError> {
    match config.relay {
        MailRelayKind::Sendmail => {
            Ok(Arc::new(SendmailRelay::new(config.sendmail_command.as_deref())))
        }
        MailRelayKind::Smtp => Ok(Arc::new(SmtpRelay::new(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use lettre::message::header::ContentType;

    use super::{MailAttachment, QuoteEmail};

    fn email(reply_to: Option<&str>) -> QuoteEmail {
        QuoteEmail {
            from: "noreply@clear-away.co.uk".to_string(),
            to: "quotes@clear-away.co.uk".to_string(),
            subject: "New Waste Removal Quote Request - ClearAway UK".to_string(),
            reply_to: reply_to.map(str::to_string),
            html: "<p>Hello</p>".to_string(),
            attachments: vec![MailAttachment {
                name: "sofa.jpg".to_string(),
                content_type: ContentType::parse("image/jpeg").expect("valid content type"),
                content: vec![0xFF, 0xD8, 0xFF],
            }],
        }
    }

    #[test]
    fn message_carries_reply_to_and_attachment() {
        let message = email(Some("a@x.com")).to_message().expect("message builds");
        let formatted = String::from_utf8(message.formatted()).expect("utf8 message");

        assert!(formatted.contains("Reply-To: a@x.com"));
        assert!(formatted.contains("To: quotes@clear-away.co.uk"));
        assert!(formatted.contains("filename=\"sofa.jpg\""));
    }

    #[test]
    fn phone_contact_is_not_used_as_reply_to() {
        let message = email(Some("07700 900123")).to_message().expect("message builds");
        let formatted = String::from_utf8(message.formatted()).expect("utf8 message");

        assert!(!formatted.contains("Reply-To"));
    }

    #[test]
    fn invalid_sender_is_an_address_error() {
        let mut broken = email(None);
        broken.from = "not an address".to_string();

        let error = broken.to_message().expect_err("sender should not parse");
        assert!(error.to_string().contains("not an address"));
    }
}
