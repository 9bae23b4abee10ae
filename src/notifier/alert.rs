// src/notifier/alert.rs
use crate::health::ProbeError;
use crate::secrets::{Credentials, SecretValue};
use chrono::{DateTime, Utc};
use url::Url;

pub const ALERT_SUBJECT: &str = "ALERT: Website is down!";

/// One outbound alert. Building one requires the probe failure it reports.
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
    pub sender_name: String,
    pub sender_address: String,
    pub sender_credential: SecretValue,
    pub recipient_address: String,
}

impl AlertMessage {
    /// Alert for a site that failed its check with `reason`.
    pub fn site_down(
        target: &Url,
        reason: &ProbeError,
        checked_at: DateTime<Utc>,
        credentials: Credentials,
        sender_name: &str,
        recipient: &str,
    ) -> Self {
        let body = format!(
            "Website at {} is not responding.\n\nReason: {}\nChecked at: {}\n",
            target,
            reason,
            checked_at.to_rfc3339(),
        );

        Self {
            subject: ALERT_SUBJECT.to_string(),
            body,
            sender_name: sender_name.to_string(),
            sender_address: credentials.sender_email,
            sender_credential: credentials.sender_password,
            recipient_address: recipient.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            sender_email: "sender@example.com".to_string(),
            sender_password: SecretValue::new("hunter2"),
        }
    }

    #[test]
    fn test_alert_references_target() {
        let target = Url::parse("https://example.com").unwrap();

        let alert = AlertMessage::site_down(
            &target,
            &ProbeError::Timeout,
            Utc::now(),
            credentials(),
            "Probe",
            "ops@example.com",
        );

        assert_eq!(alert.subject, "ALERT: Website is down!");
        assert!(alert.body.starts_with("Website at https://example.com/ is not responding."));
        assert!(alert.body.contains("Reason: Request timeout"));
        assert_eq!(alert.sender_address, "sender@example.com");
        assert_eq!(alert.recipient_address, "ops@example.com");
        assert!(!format!("{:?}", alert).contains("hunter2"));
    }

    #[test]
    fn test_alert_carries_status_reason() {
        let target = Url::parse("https://example.com/health").unwrap();

        let alert = AlertMessage::site_down(
            &target,
            &ProbeError::UnhealthyStatus(503),
            Utc::now(),
            credentials(),
            "Probe",
            "ops@example.com",
        );

        assert!(alert.body.contains("https://example.com/health"));
        assert!(alert.body.contains("Reason: HTTP 503"));
    }
}
