//! Outgoing email. Handlers only see the `Mailer` trait carried in
//! `AppState`; the SMTP transport is chosen once at startup.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Message could not be built: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Send task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError>;
}

/// Relays through the configured SMTP server.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let transport = SmtpTransport::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();
        Ok(Self {
            transport,
            from: config.from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(email.to.parse()?)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)?;

        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message)).await??;
        info!("Email sent to {}", email.to);
        Ok(())
    }
}

/// Used when no SMTP server is configured: the message only reaches the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        warn!(
            to = %email.to,
            subject = %email.subject,
            "SMTP not configured, email not delivered:\n{}",
            email.body
        );
        Ok(())
    }
}

pub fn verification_email(to: &str, username: &str, code: &str, ttl_minutes: i64) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Email Verification - GO JOB".to_string(),
        body: format!(
            "Hello {username},\n\n\
             Thank you for registering with GO JOB. Your verification code is:\n\n\
             {code}\n\n\
             This code will expire in {ttl_minutes} minutes.\n\
             If you didn't create this account, please ignore this email.\n\n\
             GO JOB Team\n"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_email_contents() {
        let email = verification_email("ana@example.com", "ana", "123456", 10);
        assert_eq!(email.to, "ana@example.com");
        assert!(email.subject.contains("Verification"));
        assert!(email.body.contains("123456"));
        assert!(email.body.contains("10 minutes"));
        assert!(email.body.contains("Hello ana"));
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        let email = verification_email("ana@example.com", "ana", "123456", 10);
        assert!(LogMailer.send(email).await.is_ok());
    }

    #[test]
    fn test_smtp_mailer_rejects_bad_sender() {
        let config = SmtpConfig {
            host: "smtp.example.com".into(),
            port: 587,
            user: "u".into(),
            pass: "p".into(),
            from: "not an address".into(),
        };
        assert!(matches!(
            SmtpMailer::new(&config),
            Err(EmailError::Address(_))
        ));
    }
}
