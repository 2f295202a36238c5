//! Auth-metadata discovery.
//!
//! Probes the server's `.well-known` OAuth metadata locations to determine
//! which auth flow it actually supports. Discovery fails soft: an unreachable
//! metadata endpoint yields a best-guess response with `error` set, never a
//! hard failure that would block the add flow.

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use owl_core::domain::{AuthType, DiscoverAuthResponse, DiscoveredAuthType};

/// Protected resource metadata (RFC 9728).
#[derive(Debug, Deserialize)]
struct ProtectedResourceMetadata {
    #[serde(default)]
    resource: Option<String>,
    #[serde(default)]
    resource_name: Option<String>,
    #[serde(default)]
    authorization_servers: Vec<String>,
    #[serde(default)]
    scopes_supported: Vec<String>,
}

/// Authorization server metadata (RFC 8414 / OIDC discovery).
#[derive(Debug, Deserialize)]
struct AuthServerMetadata {
    #[serde(default)]
    registration_endpoint: Option<String>,
    #[serde(default)]
    scopes_supported: Vec<String>,
}

enum FetchFailure {
    /// Endpoint answered but had no usable metadata (404, non-JSON, ...)
    NoMetadata,
    /// Could not reach the endpoint at all
    Transport(String),
}

/// Auth discovery prober.
pub struct AuthDiscovery {
    client: reqwest::Client,
}

impl AuthDiscovery {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("ClaudeOwl/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    /// Determine the auth flow `endpoint` actually supports.
    ///
    /// `declared` is the directory's declared auth type, used as the
    /// best-guess answer when no OAuth metadata is found.
    pub async fn discover(&self, endpoint: &str, declared: AuthType) -> DiscoverAuthResponse {
        let origin = match endpoint_origin(endpoint) {
            Ok(origin) => origin,
            Err(e) => {
                return DiscoverAuthResponse::declared(declared_guess(declared))
                    .with_error(format!("invalid endpoint: {}", e));
            }
        };

        // Protected resource metadata names the authorization server and the
        // scopes the resource wants.
        let resource_url = format!("{}/.well-known/oauth-protected-resource", origin);
        let resource = self
            .fetch_json::<ProtectedResourceMetadata>(&resource_url)
            .await;

        let (protected_resource, mut scopes, issuer) = match &resource {
            Ok(meta) => (
                meta.resource_name.clone().or_else(|| meta.resource.clone()),
                meta.scopes_supported.clone(),
                meta.authorization_servers.first().cloned(),
            ),
            Err(_) => (None, Vec::new(), None),
        };
        let issuer = issuer.unwrap_or_else(|| origin.clone());

        match self.fetch_auth_server_metadata(&issuer).await {
            Ok(meta) => {
                if scopes.is_empty() {
                    scopes = meta.scopes_supported;
                }
                let supports_dcr = meta.registration_endpoint.is_some();
                let auth_type = if supports_dcr {
                    DiscoveredAuthType::OauthDcr
                } else {
                    // OAuth without DCR: recommend the API-key/PAT fallback.
                    DiscoveredAuthType::OauthStatic
                };
                info!(
                    "Auth discovery for {}: {:?} (dcr={})",
                    endpoint, auth_type, supports_dcr
                );
                DiscoverAuthResponse {
                    auth_type,
                    supports_dcr,
                    scopes,
                    protected_resource,
                    error: None,
                }
            }
            Err(FetchFailure::NoMetadata) => {
                debug!("No OAuth metadata for {}, echoing declared type", endpoint);
                let mut response = DiscoverAuthResponse::declared(declared_guess(declared));
                response.protected_resource = protected_resource;
                response.scopes = scopes;
                response
            }
            Err(FetchFailure::Transport(e)) => {
                debug!("Auth discovery unreachable for {}: {}", endpoint, e);
                DiscoverAuthResponse::declared(declared_guess(declared))
                    .with_error(format!("auth metadata unreachable: {}", e))
            }
        }
    }

    /// RFC 8414 metadata first, OIDC discovery as fallback.
    async fn fetch_auth_server_metadata(
        &self,
        issuer: &str,
    ) -> Result<AuthServerMetadata, FetchFailure> {
        let base = issuer.trim_end_matches('/');

        let oauth_url = format!("{}/.well-known/oauth-authorization-server", base);
        match self.fetch_json::<AuthServerMetadata>(&oauth_url).await {
            Ok(meta) => return Ok(meta),
            Err(FetchFailure::Transport(e)) => return Err(FetchFailure::Transport(e)),
            Err(FetchFailure::NoMetadata) => {
                debug!("No OAuth AS metadata at {}, trying OIDC discovery", oauth_url);
            }
        }

        let oidc_url = format!("{}/.well-known/openid-configuration", base);
        self.fetch_json::<AuthServerMetadata>(&oidc_url).await
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, FetchFailure> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchFailure::NoMetadata);
        }

        response.json().await.map_err(|_| FetchFailure::NoMetadata)
    }
}

impl Default for AuthDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-guess discovered type when no OAuth metadata is available.
fn declared_guess(declared: AuthType) -> DiscoveredAuthType {
    match declared {
        AuthType::Oauth => DiscoveredAuthType::OauthStatic,
        AuthType::ApiKey | AuthType::Header => DiscoveredAuthType::ApiKey,
        AuthType::Open => DiscoveredAuthType::Open,
    }
}

fn endpoint_origin(endpoint: &str) -> anyhow::Result<String> {
    let url = Url::parse(endpoint)?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("endpoint has no host"))?;
    let origin = match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    };
    Ok(origin)
}
