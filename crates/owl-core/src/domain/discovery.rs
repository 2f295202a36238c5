//! Auth discovery outcome: what auth flow a server actually supports.

use serde::{Deserialize, Serialize};

/// Auth flow discovered by probing a server's OAuth metadata endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveredAuthType {
    /// OAuth with Dynamic Client Registration support
    OauthDcr,
    /// OAuth without DCR; callers should fall back to API key / PAT
    OauthStatic,
    /// API key (declared, no OAuth metadata found)
    ApiKey,
    /// No authentication required
    Open,
}

/// Outcome of auth-metadata probing. Created per discovery call; drives
/// negotiation but is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverAuthResponse {
    /// Best-guess auth type, even when the probe failed
    pub auth_type: DiscoveredAuthType,

    /// Whether the authorization server advertises a registration endpoint
    pub supports_dcr: bool,

    /// Scopes advertised by the server's metadata
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Declared protected-resource name, when advertised
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected_resource: Option<String>,

    /// Probe error, when the metadata endpoints were unreachable.
    /// Discovery fails soft: `auth_type` is still populated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiscoverAuthResponse {
    /// Response for a server with no OAuth metadata, echoing its declared type.
    pub fn declared(auth_type: DiscoveredAuthType) -> Self {
        Self {
            auth_type,
            supports_dcr: false,
            scopes: Vec::new(),
            protected_resource: None,
            error: None,
        }
    }

    /// Attach a probe error while keeping the best-guess auth type.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
