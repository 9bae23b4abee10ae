// src/secrets/identity.rs
// Access tokens from the managed identity of the hosting environment.
use super::SecretError;
use crate::config::IdentityConfig;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

/// Which token protocol the endpoint speaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEndpoint {
    /// App Service / Functions: `X-IDENTITY-HEADER` carries the shared secret.
    AppService { endpoint: Url, header: String },
    /// VM instance metadata service: `Metadata: true`.
    InstanceMetadata { endpoint: Url },
}

impl IdentityEndpoint {
    /// Config first, then `IDENTITY_ENDPOINT`/`IDENTITY_HEADER`, then IMDS.
    /// An explicit config endpoint without a header speaks the IMDS protocol;
    /// `IDENTITY_ENDPOINT` from the environment always needs `IDENTITY_HEADER`.
    pub fn resolve(config: &IdentityConfig) -> Result<Self, SecretError> {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    fn resolve_with(
        config: &IdentityConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SecretError> {
        let header = config.header.clone().or_else(|| env("IDENTITY_HEADER"));

        if let Some(endpoint) = &config.endpoint {
            let endpoint = endpoint.clone();
            return Ok(match header {
                Some(header) => Self::AppService { endpoint, header },
                None => Self::InstanceMetadata { endpoint },
            });
        }

        match env("IDENTITY_ENDPOINT") {
            Some(raw) => {
                let endpoint = Url::parse(&raw).map_err(|e| {
                    SecretError::Authentication(format!("invalid IDENTITY_ENDPOINT: {}", e))
                })?;
                let header = header.ok_or_else(|| {
                    SecretError::Authentication(
                        "IDENTITY_ENDPOINT is set but IDENTITY_HEADER is missing".to_string(),
                    )
                })?;
                Ok(Self::AppService { endpoint, header })
            }
            None => Ok(Self::InstanceMetadata {
                endpoint: Url::parse(IMDS_ENDPOINT)
                    .map_err(|e| SecretError::Authentication(e.to_string()))?,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct ManagedIdentityCredential {
    endpoint: IdentityEndpoint,
    resource: String,
    client_id: Option<String>,
    client: Client,
}

impl ManagedIdentityCredential {
    pub fn new(endpoint: IdentityEndpoint, config: &IdentityConfig, client: Client) -> Self {
        Self {
            endpoint,
            resource: config.resource.clone(),
            client_id: config.client_id.clone(),
            client,
        }
    }

    pub async fn access_token(&self) -> Result<String, SecretError> {
        let request = match &self.endpoint {
            IdentityEndpoint::AppService { endpoint, header } => self
                .client
                .get(endpoint.as_str())
                .query(&[("api-version", APP_SERVICE_API_VERSION), ("resource", self.resource.as_str())])
                .header("X-IDENTITY-HEADER", header),
            IdentityEndpoint::InstanceMetadata { endpoint } => self
                .client
                .get(endpoint.as_str())
                .query(&[("api-version", IMDS_API_VERSION), ("resource", self.resource.as_str())])
                .header("Metadata", "true"),
        };
        let request = match &self.client_id {
            Some(client_id) => request.query(&[("client_id", client_id)]),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Authentication failed: identity endpoint unreachable");
            SecretError::Authentication(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "Authentication failed");
            return Err(SecretError::Authentication(format!(
                "identity endpoint returned HTTP {}",
                status
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SecretError::Authentication(format!("malformed token response: {}", e)))?;

        debug!("Access token acquired successfully");
        Ok(token.access_token)
    }
}
