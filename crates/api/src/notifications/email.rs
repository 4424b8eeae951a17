//! Signature confirmation and letter update e-mails via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport. Configuration is
//! loaded from environment variables; if `SMTP_HOST` is not set,
//! [`EmailConfig::from_env`] returns `None` and no mailer is constructed.

use lettre::message::header::ContentType;
use openletter_core::sanitize::to_plain_text;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@openletter.local";

/// Configuration for the SMTP email delivery service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable        | Required | Default                     |
    /// |-----------------|----------|-----------------------------|
    /// | `SMTP_HOST`     | yes      | --                          |
    /// | `SMTP_PORT`     | no       | `587`                       |
    /// | `SMTP_FROM`     | no       | `noreply@openletter.local`  |
    /// | `SMTP_USER`     | no       | --                          |
    /// | `SMTP_PASSWORD` | no       | --                          |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends signature confirmations and letter updates via SMTP.
pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    /// Create a new email delivery service with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);
        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(builder.build())
    }

    fn message(&self, to_email: &str, subject: String, body: String) -> Result<Message, EmailError> {
        Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    /// Ask a signer to confirm their signature on `letter_title`.
    pub async fn send_signature_confirmation(
        &self,
        to_email: &str,
        signer_name: &str,
        letter_title: &str,
        confirmation_url: &str,
    ) -> Result<(), EmailError> {
        let (subject, body) = confirmation_message(signer_name, letter_title, confirmation_url);
        let email = self.message(to_email, subject, body)?;
        self.transport()?.send(email).await?;

        tracing::info!(letter = %letter_title, "Signature confirmation email sent");
        Ok(())
    }

    /// Mail one locale's update to every verified signer of that locale.
    ///
    /// A failed recipient is logged and skipped. Returns how many messages
    /// were accepted by the relay.
    pub async fn send_letter_update(
        &self,
        recipients: &[String],
        update_title: &str,
        update_text: &str,
        letter_url: &str,
    ) -> Result<usize, EmailError> {
        let transport = self.transport()?;
        let (subject, body) = update_message(update_title, update_text, letter_url);

        let mut sent = 0;
        for to in recipients {
            let result = match self.message(to, subject.clone(), body.clone()) {
                Ok(email) => transport.send(email).await.map(|_| ()).map_err(EmailError::from),
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => sent += 1,
                Err(e) => tracing::error!(error = %e, "Failed to send letter update"),
            }
        }

        tracing::info!(update = %update_title, sent, recipients = recipients.len(), "Letter update mailed");
        Ok(sent)
    }
}

/// Subject and plain-text body of a confirmation email.
fn confirmation_message(
    signer_name: &str,
    letter_title: &str,
    confirmation_url: &str,
) -> (String, String) {
    let subject = format!("Please confirm your signature: {letter_title}");
    let body = format!(
        "Hello {signer_name},\n\n\
         Thank you for signing \"{letter_title}\".\n\
         Your signature will be counted once you confirm it by opening this link:\n\n\
         {confirmation_url}\n\n\
         If you did not sign this letter, you can ignore this email."
    );
    (subject, body)
}

/// Subject and plain-text body of an update sent to a letter's signers.
///
/// The update's HTML is reduced to its text content.
fn update_message(update_title: &str, update_text: &str, letter_url: &str) -> (String, String) {
    let text = to_plain_text(update_text);
    let subject = format!("Update: {update_title}");
    let body = format!(
        "{update_title}\n\n\
         {}\n\n\
         You receive this because you signed this letter:\n\
         {letter_url}",
        text.trim()
    );
    (subject, body)
}
