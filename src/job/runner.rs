// src/job/runner.rs
use crate::config::Config;
use crate::health::{CheckResult, HealthProbe};
use crate::notifier::{AlertMessage, DeliveryError, Notifier};
use crate::secrets::{resolve_credentials, CredentialNames, SecretError, SecretStore};
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Timing context handed over by whatever fires the job. Only logged.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleStatus {
    pub last: Option<DateTime<Utc>>,
    pub next: DateTime<Utc>,
}

#[derive(Debug)]
pub enum InvocationOutcome {
    Healthy(CheckResult),
    AlertSent(CheckResult),
    SecretResolutionFailed {
        check: CheckResult,
        error: SecretError,
    },
    DeliveryFailed {
        check: CheckResult,
        error: DeliveryError,
    },
}

impl InvocationOutcome {
    pub fn check(&self) -> &CheckResult {
        match self {
            Self::Healthy(check) | Self::AlertSent(check) => check,
            Self::SecretResolutionFailed { check, .. } | Self::DeliveryFailed { check, .. } => check,
        }
    }

    pub fn alert_attempted(&self) -> bool {
        matches!(self, Self::AlertSent(_) | Self::DeliveryFailed { .. })
    }
}

/// Probe once, alert on failure. Holds no state between invocations.
pub struct HealthCheckJob {
    probe: HealthProbe,
    secrets: Arc<dyn SecretStore>,
    notifier: Arc<dyn Notifier>,
    credential_names: CredentialNames,
    sender_name: String,
    recipient: String,
}

impl HealthCheckJob {
    pub fn new(
        config: &Config,
        secrets: Arc<dyn SecretStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        Ok(Self {
            probe: HealthProbe::new(&config.target)?,
            secrets,
            notifier,
            credential_names: CredentialNames {
                email: config.key_vault.email_secret.clone(),
                password: config.key_vault.password_secret.clone(),
            },
            sender_name: config.mail.sender_name.clone(),
            recipient: config.mail.recipient.clone(),
        })
    }

    /// Single entry point for any scheduler. Never fails; every failure is
    /// logged and reported through the returned outcome.
    pub async fn run_check(&self, schedule: Option<&ScheduleStatus>) -> InvocationOutcome {
        info!("Timer trigger executed at: {}", Local::now());
        if let Some(schedule) = schedule {
            if let Some(last) = schedule.last {
                info!("Previous timer schedule at: {}", last);
            }
            info!("Next timer schedule at: {}", schedule.next);
        }

        let check = self.probe.check().await;
        let Some(reason) = check.error.clone() else {
            info!(target_url = %check.target, "Website is {}", check);
            return InvocationOutcome::Healthy(check);
        };
        warn!(target_url = %check.target, "Website is {}", check);

        let credentials =
            match resolve_credentials(self.secrets.as_ref(), &self.credential_names).await {
                Ok(credentials) => credentials,
                Err(error) => {
                    match &error {
                        SecretError::Authentication(_) => {
                            error!(error = %error, "Authentication failed, alert not sent")
                        }
                        _ => error!(error = %error, "Failed to fetch mail credentials, alert not sent"),
                    }
                    return InvocationOutcome::SecretResolutionFailed { check, error };
                }
            };

        let alert = AlertMessage::site_down(
            &check.target,
            &reason,
            check.timestamp,
            credentials,
            &self.sender_name,
            &self.recipient,
        );

        match self.notifier.send(&alert).await {
            Ok(()) => {
                info!(recipient = %alert.recipient_address, "Email alert sent successfully");
                InvocationOutcome::AlertSent(check)
            }
            Err(error) => {
                error!(error = %error, "Failed to send email alert");
                InvocationOutcome::DeliveryFailed { check, error }
            }
        }
    }
}
