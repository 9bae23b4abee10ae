// src/health/checker.rs
use super::{CheckResult, ProbeError};
use crate::config::TargetConfig;
use anyhow::{Context, Result};
use reqwest::Client;
use tokio::time::{timeout, Duration};
use tracing::{error, info};
use url::Url;

/// Issues a single GET against the monitored URL.
pub struct HealthProbe {
    target: Url,
    timeout: Duration,
    client: Client,
}

impl HealthProbe {
    pub fn new(config: &TargetConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            target: config.url.clone(),
            timeout: config.timeout(),
            client,
        })
    }

    /// Never fails: transport errors become an unhealthy result.
    pub async fn check(&self) -> CheckResult {
        let start = std::time::Instant::now();

        let result = timeout(
            self.timeout,
            self.client.get(self.target.as_str()).send(),
        )
        .await;

        let response_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(response)) => {
                let status = response.status();
                info!(
                    target_url = %self.target,
                    status = status.as_u16(),
                    response_time_ms,
                    "Website response: {}",
                    status
                );
                CheckResult::from_status(self.target.clone(), status.as_u16(), response_time_ms)
            }
            Ok(Err(e)) => {
                let probe_error = classify(&e);
                error!(target_url = %self.target, error = %e, "Website health check failed");
                CheckResult::from_error(self.target.clone(), probe_error, response_time_ms)
            }
            Err(_) => {
                error!(target_url = %self.target, "Website health check failed: request timeout");
                CheckResult::from_error(self.target.clone(), ProbeError::Timeout, response_time_ms)
            }
        }
    }
}

fn classify(e: &reqwest::Error) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout
    } else if e.is_connect() {
        ProbeError::Connect(e.to_string())
    } else {
        ProbeError::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_for(url: &str, timeout_secs: u64) -> HealthProbe {
        HealthProbe::new(&TargetConfig {
            url: Url::parse(url).unwrap(),
            timeout_secs,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_ok_response_is_healthy() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/").with_status(200).create_async().await;

        let result = probe_for(&server.url(), 5).check().await;

        mock.assert_async().await;
        assert!(result.healthy);
        assert_eq!(result.status, Some(200));
    }

    #[tokio::test]
    async fn test_service_unavailable_is_unhealthy() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(503).create_async().await;

        let result = probe_for(&server.url(), 5).check().await;

        assert!(!result.healthy);
        assert_eq!(result.status, Some(503));
        assert_eq!(result.error, Some(ProbeError::UnhealthyStatus(503)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unhealthy() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = probe_for(&format!("http://127.0.0.1:{}/", port), 5).check().await;

        assert!(!result.healthy);
        assert!(matches!(result.error, Some(ProbeError::Connect(_))));
    }

    #[tokio::test]
    async fn test_unresponsive_server_times_out() {
        // Accepts at the socket level, never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());

        let result = probe_for(&url, 1).check().await;

        assert!(!result.healthy);
        assert_eq!(result.error, Some(ProbeError::Timeout));
        drop(listener);
    }
}
