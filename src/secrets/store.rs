// src/secrets/store.rs
use async_trait::async_trait;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecretError {
    #[error("Secret '{0}' not found")]
    NotFound(String),

    #[error("Access to secret '{name}' denied (HTTP {status})")]
    Unauthorized { name: String, status: u16 },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Secret store unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid secret store response: {0}")]
    InvalidResponse(String),

    #[error("Secret '{0}' is empty")]
    Empty(String),
}

/// A sensitive string. `Debug` and `Display` never print the contents.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(<redacted>)")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Named-secret lookup.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn resolve_secret(&self, name: &str) -> Result<SecretValue, SecretError>;
}

/// Sender mailbox login, fetched per invocation and dropped afterwards.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub sender_email: String,
    pub sender_password: SecretValue,
}

/// Secret names holding the sender login.
#[derive(Debug, Clone)]
pub struct CredentialNames {
    pub email: String,
    pub password: String,
}

impl Default for CredentialNames {
    fn default() -> Self {
        Self {
            email: "Email".to_string(),
            password: "Password".to_string(),
        }
    }
}

/// Fetch the sender email, then the password. Stops at the first failure.
pub async fn resolve_credentials(
    store: &dyn SecretStore,
    names: &CredentialNames,
) -> Result<Credentials, SecretError> {
    let email = store.resolve_secret(&names.email).await?;
    let password = store.resolve_secret(&names.password).await?;

    Ok(Credentials {
        sender_email: email.expose().trim().to_string(),
        sender_password: password,
    })
}
