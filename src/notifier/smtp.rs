// src/notifier/smtp.rs
use super::AlertMessage;
use crate::config::{MailConfig, MailSecurity};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// Delivers an alert. One call, one message, no retained state.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, alert: &AlertMessage) -> Result<(), DeliveryError>;
}

/// SMTP submission over TLS with AUTH.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    relay_host: String,
    port: u16,
    security: MailSecurity,
    timeout: Duration,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            relay_host: config.relay_host.clone(),
            port: config.port(),
            security: config.security,
            timeout: config.timeout(),
        }
    }

    fn transport(
        &self,
        credentials: SmtpCredentials,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let builder = match self.security {
            MailSecurity::ImplicitTls => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.relay_host),
            MailSecurity::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.relay_host)
            }
        }
        .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        Ok(builder
            .port(self.port)
            .credentials(credentials)
            .timeout(Some(self.timeout))
            .build())
    }
}

/// Plain-text message with one sender and one recipient.
pub fn build_message(alert: &AlertMessage) -> Result<Message, DeliveryError> {
    let from = Mailbox::new(
        Some(alert.sender_name.clone()),
        parse_address(&alert.sender_address)?,
    );
    let to = Mailbox::new(None, parse_address(&alert.recipient_address)?);

    Message::builder()
        .from(from)
        .to(to)
        .subject(alert.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(alert.body.clone())
        .map_err(|e| DeliveryError::Message(e.to_string()))
}

fn parse_address(raw: &str) -> Result<Address, DeliveryError> {
    raw.trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| DeliveryError::InvalidAddress {
            address: raw.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, alert: &AlertMessage) -> Result<(), DeliveryError> {
        let message = build_message(alert)?;
        let credentials = SmtpCredentials::new(
            alert.sender_address.clone(),
            alert.sender_credential.expose().to_string(),
        );

        // Without connection pooling the transport sends QUIT after every message.
        let mailer = self.transport(credentials)?;

        debug!(
            relay = %self.relay_host,
            port = self.port,
            security = ?self.security,
            "Submitting alert"
        );

        mailer
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::SecretValue;

    fn alert(sender: &str, recipient: &str) -> AlertMessage {
        AlertMessage {
            subject: "ALERT: Website is down!".to_string(),
            body: "Website at https://example.com/ is not responding.".to_string(),
            sender_name: "Site Health Probe".to_string(),
            sender_address: sender.to_string(),
            sender_credential: SecretValue::new("hunter2"),
            recipient_address: recipient.to_string(),
        }
    }

    fn config(port: u16, security: MailSecurity) -> MailConfig {
        MailConfig {
            relay_host: "127.0.0.1".to_string(),
            port: Some(port),
            security,
            recipient: "ops@example.com".to_string(),
            sender_name: "Site Health Probe".to_string(),
            timeout_secs: 2,
        }
    }

    #[test]
    fn test_build_plain_text_message() {
        let message = build_message(&alert("sender@example.com", "ops@example.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw
            .lines()
            .any(|l| l.starts_with("From:") && l.contains("Site Health Probe") && l.contains("<sender@example.com>")));
        assert!(raw.lines().any(|l| l.starts_with("To:") && l.contains("ops@example.com")));
        assert!(raw.contains("Subject: ALERT: Website is down!"));
        assert!(raw.contains("Content-Type: text/plain; charset=utf-8"));
        assert!(raw.contains("Website at https://example.com/ is not responding."));
        assert!(!raw.contains("hunter2"));
    }

    #[test]
    fn test_invalid_sender_address() {
        let err = build_message(&alert("not-an-address", "ops@example.com")).unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidAddress { address, .. } if address == "not-an-address"));
    }

    #[tokio::test]
    async fn test_invalid_address_fails_before_connecting() {
        let notifier = SmtpNotifier::new(&config(465, MailSecurity::ImplicitTls));
        let result = notifier.send(&alert("sender@example.com", "broken")).await;
        assert!(matches!(result, Err(DeliveryError::InvalidAddress { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_reported() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        for security in [MailSecurity::ImplicitTls, MailSecurity::Starttls] {
            let notifier = SmtpNotifier::new(&config(port, security));
            let result = notifier.send(&alert("sender@example.com", "ops@example.com")).await;
            assert!(matches!(result, Err(DeliveryError::Transport(_))));
        }
    }
}
