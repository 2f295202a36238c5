//! Derived security context for a server. Computed fresh on every detail
//! request and never cached, since TLS validity can change between probes.

use serde::{Deserialize, Serialize};

/// Risk level, ordered by severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Signals collected from a connection probe that feed risk assessment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeSignals {
    /// `Some(false)` when the TLS step recorded a warning (self-signed,
    /// expired, or plain HTTP); `None` when the endpoint has not been probed.
    pub tls_valid: Option<bool>,
}

impl ProbeSignals {
    /// Extract risk-relevant signals from a finished connection test.
    pub fn from_test_result(result: &crate::domain::ConnectionTestResult) -> Self {
        let tls_valid = result
            .step("tls")
            .map(|s| s.status == crate::domain::StepStatus::Success);
        Self { tls_valid }
    }
}

/// Security assessment derived from a descriptor plus probe signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityContext {
    /// Maximum severity among triggered risk factors
    pub risk_level: RiskLevel,

    /// Whether the entry comes from a curated/trusted source
    pub is_verified_provider: bool,

    /// Whether the integration is official (published by the service itself)
    pub is_official_server: bool,

    /// TLS validity; `true` when unprobed (unknown is not a finding)
    pub has_valid_tls: bool,

    /// Ordered list of triggered risk factor descriptions
    pub risk_factors: Vec<String>,

    /// Scopes the server requests during authorization
    pub requested_scopes: Vec<String>,

    /// Summary of what data the server can reach
    pub data_access_description: String,
}
