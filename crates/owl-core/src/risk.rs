//! Security risk assessment.
//!
//! `assess` is a pure function over a descriptor and probe signals so it can
//! be tested without any network or registry state. Thresholds are explicit
//! policy, not hardcoded magic numbers.

use crate::domain::{ProbeSignals, RiskLevel, SecurityContext, ServerDescriptor};

/// Configurable thresholds for scope-based risk heuristics.
#[derive(Debug, Clone)]
pub struct RiskPolicy {
    /// Requesting more than this many scopes counts as broad access
    pub broad_scope_threshold: usize,

    /// Scope-name fragments that indicate sensitive access (matched
    /// case-insensitively as substrings)
    pub sensitive_scope_patterns: Vec<String>,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            broad_scope_threshold: 3,
            sensitive_scope_patterns: vec![
                "write".to_string(),
                "admin".to_string(),
                "delete".to_string(),
                "all".to_string(),
            ],
        }
    }
}

/// Compute a security context from a descriptor and probe signals.
///
/// Each rule is evaluated independently and contributes at most one risk
/// factor; the overall level is the maximum severity among triggered factors.
pub fn assess(
    server: &ServerDescriptor,
    signals: &ProbeSignals,
    policy: &RiskPolicy,
) -> SecurityContext {
    let mut risk_level = RiskLevel::Low;
    let mut risk_factors = Vec::new();

    if !server.verified {
        risk_factors.push("Unverified provider".to_string());
        risk_level = risk_level.max(RiskLevel::Medium);
    }

    if signals.tls_valid == Some(false) {
        risk_factors.push("Missing or invalid TLS certificate".to_string());
        risk_level = risk_level.max(RiskLevel::High);
    }

    let scopes = server.auth.scopes();
    if is_broad_access(scopes, policy) {
        risk_factors.push(format!(
            "Requests broad access scopes: {}",
            scopes.join(", ")
        ));
        risk_level = risk_level.max(RiskLevel::Medium);
    }

    SecurityContext {
        risk_level,
        is_verified_provider: server.verified,
        is_official_server: server.provider.official,
        has_valid_tls: signals.tls_valid.unwrap_or(true),
        risk_factors,
        requested_scopes: scopes.to_vec(),
        data_access_description: describe_data_access(server),
    }
}

fn is_broad_access(scopes: &[String], policy: &RiskPolicy) -> bool {
    if scopes.len() > policy.broad_scope_threshold {
        return true;
    }
    scopes.iter().any(|scope| {
        let scope = scope.to_lowercase();
        policy
            .sensitive_scope_patterns
            .iter()
            .any(|pattern| scope.contains(&pattern.to_lowercase()))
    })
}

fn describe_data_access(server: &ServerDescriptor) -> String {
    let scopes = server.auth.scopes();
    if scopes.is_empty() {
        format!(
            "Can access {} data exposed by {}",
            server.category.as_str(),
            server.provider.name
        )
    } else {
        format!(
            "Can access {} data from {} within scopes: {}",
            server.category.as_str(),
            server.provider.name,
            scopes.join(", ")
        )
    }
}
