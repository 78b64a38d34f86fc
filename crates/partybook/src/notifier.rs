//! Delivery of booking notifications.
//!
//! The booking service only knows the [`Notifier`] trait. [`SmtpNotifier`]
//! is the production implementation, relaying through an SMTP server with
//! lettre's async transport.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::MailConfig;
use crate::error::{Error, Result};

/// A composed booking notification, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingEmail {
    /// Subject line.
    pub subject: String,
    /// Address replies should go to (the customer).
    pub reply_to: String,
    /// Plain-text body.
    pub text: String,
    /// HTML body.
    pub html: String,
}

/// Errors from sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The message could not be assembled.
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    /// The SMTP exchange failed (connection, TLS, auth or rejection).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// Delivery took longer than allowed.
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    /// Any other delivery failure.
    #[error("delivery failed: {0}")]
    Other(String),
}

/// Something that can deliver a booking notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be delivered.
    async fn send(&self, email: &BookingEmail) -> std::result::Result<(), NotifyError>;
}

/// Sends notifications through an SMTP relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    /// Build a notifier from mail configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay host or either mailbox is invalid.
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let from: Mailbox = config
            .mail_from
            .parse()
            .map_err(|e| Error::mail_setup(format!("invalid mail_from: {e}")))?;
        let to: Mailbox = config
            .mail_to
            .parse()
            .map_err(|e| Error::mail_setup(format!("invalid mail_to: {e}")))?;

        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| Error::mail_setup(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        match (&config.smtp_user, &config.smtp_pass) {
            (Some(user), Some(pass)) => {
                builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("Only one of smtp_user/smtp_pass is set; sending without authentication");
            }
            (None, None) => {}
        }

        debug!(
            host = %config.smtp_host,
            port = config.smtp_port,
            starttls = config.starttls,
            "Configured SMTP transport"
        );

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    fn build_message(&self, email: &BookingEmail) -> std::result::Result<Message, NotifyError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(email.subject.as_str());

        match email.reply_to.parse::<Mailbox>() {
            Ok(reply_to) => builder = builder.reply_to(reply_to),
            Err(e) => warn!("Leaving out reply-to '{}': {e}", email.reply_to),
        }

        let body = MultiPart::alternative()
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(email.text.clone()),
            )
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(email.html.clone()),
            );

        Ok(builder.multipart(body)?)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, email: &BookingEmail) -> std::result::Result<(), NotifyError> {
        let message = self.build_message(email)?;
        let response = self.transport.send(message).await?;
        debug!(code = %response.code(), "SMTP relay accepted message");
        Ok(())
    }
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}
