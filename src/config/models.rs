// src/config/models.rs
use anyhow::{bail, Context, Result};
use lettre::Address;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    pub key_vault: KeyVaultConfig,
    pub mail: MailConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// The single monitored endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub url: Url,
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyVaultConfig {
    pub vault_url: Url,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_vault_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_email_secret")]
    pub email_secret: String,
    #[serde(default = "default_password_secret")]
    pub password_secret: String,
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Managed identity token source. Every field is optional; unset fields
/// fall back to the `IDENTITY_ENDPOINT`/`IDENTITY_HEADER` environment and
/// finally to the instance metadata service.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub endpoint: Option<Url>,
    pub header: Option<String>,
    pub client_id: Option<String>,
    #[serde(default = "default_resource")]
    pub resource: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailSecurity {
    /// TLS from the first byte, usually port 465.
    ImplicitTls,
    /// Plain connect upgraded with STARTTLS before AUTH, usually port 587.
    Starttls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_relay_host")]
    pub relay_host: String,
    /// Defaults to the well-known port for `security`.
    pub port: Option<u16>,
    #[serde(default = "default_security")]
    pub security: MailSecurity,
    pub recipient: String,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
    /// Defaults to the interval so a slow invocation never runs into the next tick.
    pub invocation_budget_secs: Option<u64>,
}

fn default_probe_timeout() -> u64 { 30 }
fn default_api_version() -> String { "7.4".to_string() }
fn default_vault_timeout() -> u64 { 10 }
fn default_email_secret() -> String { "Email".to_string() }
fn default_password_secret() -> String { "Password".to_string() }
fn default_resource() -> String { "https://vault.azure.net".to_string() }
fn default_relay_host() -> String { "smtp.gmail.com".to_string() }
fn default_security() -> MailSecurity { MailSecurity::ImplicitTls }
fn default_sender_name() -> String { "Site Health Probe".to_string() }
fn default_mail_timeout() -> u64 { 30 }
fn default_interval() -> u64 { 120 }
fn default_true() -> bool { true }

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            header: None,
            client_id: None,
            resource: default_resource(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            run_on_startup: true,
            invocation_budget_secs: None,
        }
    }
}

impl TargetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl KeyVaultConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MailSecurity {
    pub fn default_port(self) -> u16 {
        match self {
            Self::ImplicitTls => 465,
            Self::Starttls => 587,
        }
    }
}

impl MailConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.security.default_port())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn recipient_address(&self) -> Result<Address> {
        self.recipient
            .parse()
            .with_context(|| format!("Invalid recipient address: {}", self.recipient))
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn invocation_budget(&self) -> Duration {
        Duration::from_secs(self.invocation_budget_secs.unwrap_or(self.interval_secs))
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.target.url.scheme(), "http" | "https") {
            bail!("target.url must be http or https, got {}", self.target.url);
        }
        if self.target.timeout_secs == 0 {
            bail!("target.timeout_secs must be greater than 0");
        }

        let vault = &self.key_vault.vault_url;
        if vault.scheme() != "https" && !is_loopback(vault) {
            bail!("key_vault.vault_url must use https, got {}", vault);
        }
        if self.key_vault.timeout_secs == 0 {
            bail!("key_vault.timeout_secs must be greater than 0");
        }
        if self.key_vault.email_secret.trim().is_empty()
            || self.key_vault.password_secret.trim().is_empty()
        {
            bail!("key_vault secret names must not be empty");
        }

        if self.mail.relay_host.trim().is_empty() {
            bail!("mail.relay_host must not be empty");
        }
        match (self.mail.port, self.mail.security) {
            (Some(0), _) => bail!("mail.port must not be 0"),
            (Some(465), MailSecurity::Starttls) | (Some(587), MailSecurity::ImplicitTls) => warn!(
                "mail.port {} does not match mail.security {:?}; the relay will likely not answer",
                self.mail.port(),
                self.mail.security
            ),
            _ => {}
        }
        if self.mail.timeout_secs == 0 {
            bail!("mail.timeout_secs must be greater than 0");
        }
        self.mail.recipient_address()?;

        let schedule = &self.schedule;
        if schedule.interval_secs == 0 {
            bail!("schedule.interval_secs must be greater than 0");
        }
        if self.target.timeout_secs >= schedule.interval_secs {
            bail!(
                "target.timeout_secs ({}) must be shorter than schedule.interval_secs ({})",
                self.target.timeout_secs,
                schedule.interval_secs
            );
        }
        match schedule.invocation_budget_secs {
            Some(0) => bail!("schedule.invocation_budget_secs must be greater than 0"),
            Some(budget) if budget > schedule.interval_secs => bail!(
                "schedule.invocation_budget_secs ({}) must not exceed schedule.interval_secs ({})",
                budget,
                schedule.interval_secs
            ),
            _ => {}
        }

        Ok(())
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(domain)) => domain == "localhost",
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}
