use crate::config::EmailConfig;
use crate::error::CheckError;
use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{error, info};

/// Delivers a rendered report to the configured recipients
pub trait Mailer {
    fn send_html(&self, subject: &str, html: &str) -> Result<()>;
}

/// SMTP delivery with STARTTLS
pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, subject: &str, html: &str) -> Result<Message> {
        if self.config.recipients.is_empty() {
            return Err(CheckError::MailConfig("no recipients (set EMAIL_RECIPIENTS)".into()).into());
        }

        let sender = self.config.sender()?;
        let mut builder = Message::builder()
            .from(sender.parse::<Mailbox>().with_context(|| format!("Invalid sender address: {}", sender))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML);

        for recipient in &self.config.recipients {
            builder = builder.to(recipient
                .parse::<Mailbox>()
                .with_context(|| format!("Invalid recipient address: {}", recipient))?);
        }

        builder
            .body(html.to_string())
            .context("Failed to build email message")
    }

    fn deliver(&self, message: &Message) -> Result<()> {
        let mut transport = SmtpTransport::starttls_relay(&self.config.smtp_host)
            .with_context(|| format!("Invalid SMTP relay: {}", self.config.smtp_host))?
            .port(self.config.smtp_port);

        if let (Some(user), Some(password)) = (&self.config.username, &self.config.password) {
            transport = transport.credentials(Credentials::new(user.clone(), password.clone()));
        }

        transport
            .build()
            .send(message)
            .context("SMTP delivery failed")?;
        Ok(())
    }
}

impl Mailer for SmtpMailer {
    fn send_html(&self, subject: &str, html: &str) -> Result<()> {
        let result = self
            .build_message(subject, html)
            .and_then(|message| self.deliver(&message));

        match &result {
            Ok(()) => info!("HTML email sent to {} recipient(s)", self.config.recipients.len()),
            Err(e) => error!("Failed to send HTML email: {:#}", e),
        }
        result
    }
}
