// src/secrets/key_vault.rs
use super::identity::{IdentityEndpoint, ManagedIdentityCredential};
use super::{SecretError, SecretStore, SecretValue};
use crate::config::KeyVaultConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

#[derive(Debug, Deserialize)]
struct SecretBundle {
    value: Option<String>,
}

/// Key Vault secrets over the REST API, authorized with a managed identity token.
pub struct KeyVaultSecretStore {
    vault_url: Url,
    api_version: String,
    credential: ManagedIdentityCredential,
    client: Client,
}

impl KeyVaultSecretStore {
    pub fn new(config: &KeyVaultConfig) -> Result<Self> {
        let endpoint = IdentityEndpoint::resolve(&config.identity)
            .context("Failed to resolve managed identity endpoint")?;
        Self::with_identity(config, endpoint)
    }

    pub fn with_identity(config: &KeyVaultConfig, endpoint: IdentityEndpoint) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            vault_url: config.vault_url.clone(),
            api_version: config.api_version.clone(),
            credential: ManagedIdentityCredential::new(endpoint, &config.identity, client.clone()),
            client,
        })
    }

    fn secret_url(&self, name: &str) -> Result<Url, SecretError> {
        let mut url = self.vault_url.clone();
        url.path_segments_mut()
            .map_err(|_| SecretError::InvalidResponse(format!("unusable vault url {}", self.vault_url)))?
            .pop_if_empty()
            .extend(["secrets", name]);
        url.query_pairs_mut().append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

#[async_trait]
impl SecretStore for KeyVaultSecretStore {
    async fn resolve_secret(&self, name: &str) -> Result<SecretValue, SecretError> {
        let token = self.credential.access_token().await?;
        let url = self.secret_url(name)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                error!(secret = name, error = %e, "Key Vault request failed");
                SecretError::Unreachable(e.to_string())
            })?;

        match response.status() {
            status if status.is_success() => {
                let bundle: SecretBundle = response
                    .json()
                    .await
                    .map_err(|e| SecretError::InvalidResponse(e.to_string()))?;

                match bundle.value {
                    Some(value) if !value.is_empty() => {
                        debug!(secret = name, "Secret resolved");
                        Ok(SecretValue::new(value))
                    }
                    _ => Err(SecretError::Empty(name.to_string())),
                }
            }
            StatusCode::NOT_FOUND => Err(SecretError::NotFound(name.to_string())),
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err(SecretError::Unauthorized {
                    name: name.to_string(),
                    status: status.as_u16(),
                })
            }
            status => Err(SecretError::Unreachable(format!(
                "Key Vault returned HTTP {} for '{}'",
                status, name
            ))),
        }
    }
}
