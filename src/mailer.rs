//! SMTP transport collaborator.
//!
//! Implements the core `Mailer` seam with lettre: one STARTTLS relay
//! connection, and a three-part alternative message per send (plain text,
//! HTML, and a `text/calendar` REQUEST part so mail clients render an RSVP
//! strip instead of a bare attachment).

use anyhow::{Context, Result};
use async_trait::async_trait;
use ipo_reminder_core::{Mailer, OutgoingEmail, ReminderError, ReminderResult};
use lettre::message::header::{ContentType, Header, HeaderName, HeaderValue};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;

/// Marks the message as a calendar message for Outlook-family clients.
#[derive(Debug, Clone, Copy)]
struct ContentClass;

impl Header for ContentClass {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Content-Class")
    }

    fn parse(_s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self)
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), "urn:content-classes:calendarmessage".to_string())
    }
}

/// Asks Outlook to open the invite inspector directly.
#[derive(Debug, Clone, Copy)]
struct ForceInspectorOpen;

impl Header for ForceInspectorOpen {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-MS-OLK-FORCEINSPECTOROPEN")
    }

    fn parse(_s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self)
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), "TRUE".to_string())
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .context("invalid SMTP relay host")?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_pass.clone(),
            ))
            .build();
        let from = Mailbox::new(
            Some(config.sender_name.clone()),
            config
                .sender_email
                .parse()
                .context("invalid sender email address")?,
        );
        Ok(Self { transport, from })
    }
}

/// Compose the wire message: text and HTML alternatives plus the calendar
/// part, most-preferred last per MIME alternative ordering.
fn build_message(from: &Mailbox, email: &OutgoingEmail<'_>) -> Result<Message> {
    let calendar_type = ContentType::parse("text/calendar; method=REQUEST; charset=UTF-8")
        .context("calendar content type")?;

    Message::builder()
        .from(from.clone())
        .to(email
            .recipient
            .parse()
            .with_context(|| format!("invalid recipient address {:?}", email.recipient))?)
        .subject(email.subject)
        .header(ContentClass)
        .header(ForceInspectorOpen)
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text_body.to_string()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html_body.to_string()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(calendar_type)
                        .body(email.invite.to_string()),
                ),
        )
        .context("message assembly failed")
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail<'_>) -> ReminderResult<()> {
        let message = build_message(&self.from, email)
            .map_err(|e| ReminderError::Transport(format!("{e:#}")))?;
        self.transport
            .send(message)
            .await
            .map_err(|e| ReminderError::Transport(e.to_string()))?;
        Ok(())
    }
}
