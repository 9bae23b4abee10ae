// src/health/result.rs
use chrono::{DateTime, Utc};
use std::fmt;
use url::Url;

/// Why a probe was classified as unhealthy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP {0}")]
    UnhealthyStatus(u16),
}

/// Outcome of one probe. Lives for a single invocation.
/// `error` is set exactly when `healthy` is false.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub timestamp: DateTime<Utc>,
    pub target: Url,
    pub healthy: bool,
    pub status: Option<u16>,
    pub error: Option<ProbeError>,
    pub response_time_ms: u64,
}

impl CheckResult {
    /// 2xx is healthy, everything else is not.
    pub fn from_status(target: Url, status: u16, response_time_ms: u64) -> Self {
        let healthy = (200..=299).contains(&status);
        Self {
            timestamp: Utc::now(),
            target,
            healthy,
            status: Some(status),
            error: (!healthy).then_some(ProbeError::UnhealthyStatus(status)),
            response_time_ms,
        }
    }

    pub fn from_error(target: Url, error: ProbeError, response_time_ms: u64) -> Self {
        Self {
            timestamp: Utc::now(),
            target,
            healthy: false,
            status: None,
            error: Some(error),
            response_time_ms,
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, self.status) {
            (None, Some(status)) => write!(f, "healthy (HTTP {})", status),
            (None, None) => write!(f, "healthy"),
            (Some(error), _) => write!(f, "unhealthy ({})", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn target() -> Url {
        Url::parse("https://example.com").unwrap()
    }

    proptest! {
        #[test]
        fn success_statuses_are_healthy(status in 200u16..=299) {
            let result = CheckResult::from_status(target(), status, 1);
            prop_assert!(result.healthy);
            prop_assert!(result.error.is_none());
        }

        #[test]
        fn other_statuses_are_unhealthy(status in (100u16..=599).prop_filter("non-2xx", |s| !(200..=299).contains(s))) {
            let result = CheckResult::from_status(target(), status, 1);
            prop_assert!(!result.healthy);
            prop_assert_eq!(result.error, Some(ProbeError::UnhealthyStatus(status)));
        }
    }

    #[test]
    fn test_errors_are_unhealthy() {
        let result = CheckResult::from_error(target(), ProbeError::Timeout, 30_000);
        assert!(!result.healthy);
        assert_eq!(result.status, None);
        assert_eq!(result.to_string(), "unhealthy (Request timeout)");
    }

    #[test]
    fn test_display() {
        let ok = CheckResult::from_status(target(), 204, 12);
        assert_eq!(ok.to_string(), "healthy (HTTP 204)");

        let down = CheckResult::from_status(target(), 503, 12);
        assert_eq!(down.to_string(), "unhealthy (HTTP 503)");
    }
}
