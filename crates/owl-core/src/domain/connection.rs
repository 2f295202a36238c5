//! Connection test results and the probe seam.
//!
//! Probe failures are data, not errors: callers always receive a
//! `ConnectionTestResult`, never an `Err`, for an expected network failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::server::Transport;

/// Status of one probe step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Success,
    Warning,
    Error,
}

/// One step of a connection test, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStep {
    /// Step name (e.g. "DNS Resolution")
    pub name: String,
    /// Outcome of this step
    pub status: StepStatus,
    /// Human-readable detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ConnectionStep {
    pub fn success(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Success,
            detail: Some(detail.into()),
        }
    }

    pub fn warning(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Warning,
            detail: Some(detail.into()),
        }
    }

    pub fn error(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Error,
            detail: Some(detail.into()),
        }
    }
}

/// Closed error taxonomy for failed connection tests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionErrorCode {
    /// Connection refused, TLS handshake failure, unexpected transport errors
    NetworkError,
    /// Malformed endpoint, caught before any network I/O
    InvalidUrl,
    /// Overall timeout budget exceeded at some step
    Timeout,
    /// Name resolution failure
    DnsError,
}

/// Outcome of one connection test run. Created fresh per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    /// Overall outcome: DNS resolved and the endpoint answered HTTP
    pub success: bool,

    /// Round-trip latency, present only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,

    /// Ordered probe steps
    pub steps: Vec<ConnectionStep>,

    /// Error message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Error code on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ConnectionErrorCode>,

    /// Remediation hints for the user
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ConnectionTestResult {
    /// Successful test with measured latency.
    pub fn succeeded(latency_ms: u64, steps: Vec<ConnectionStep>) -> Self {
        Self {
            success: true,
            latency_ms: Some(latency_ms),
            steps,
            error: None,
            error_code: None,
            suggestions: Vec::new(),
        }
    }

    /// Failed test with the steps executed so far.
    pub fn failed(
        code: ConnectionErrorCode,
        error: impl Into<String>,
        steps: Vec<ConnectionStep>,
        suggestions: Vec<String>,
    ) -> Self {
        Self {
            success: false,
            latency_ms: None,
            steps,
            error: Some(error.into()),
            error_code: Some(code),
            suggestions,
        }
    }

    /// Find a step by (case-insensitive) name fragment.
    pub fn step(&self, name_fragment: &str) -> Option<&ConnectionStep> {
        let needle = name_fragment.to_lowercase();
        self.steps
            .iter()
            .find(|s| s.name.to_lowercase().contains(&needle))
    }
}

/// Seam for the network prober, so the registry service can orchestrate
/// connection tests without depending on the probe implementation.
#[async_trait]
pub trait ConnectionTester: Send + Sync {
    /// Run one bounded reachability check against `endpoint_url`.
    async fn test(
        &self,
        endpoint_url: &str,
        transport: Transport,
        timeout: Duration,
    ) -> ConnectionTestResult;
}
