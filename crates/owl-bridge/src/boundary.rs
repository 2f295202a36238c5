//! Boundary operations.
//!
//! Each operation is request/response-shaped: expected failures come back
//! inside the response envelope, never as `Err`. The host UI can render any
//! envelope without special-casing transport errors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::warn;

use owl_connect::{ApiKeyCredentials, AuthDiscovery, ConnectionProber, NegotiationFlow, NegotiationHost};
use owl_core::domain::{
    AuthType, ConnectionErrorCode, ConnectionTestResult, DiscoverAuthResponse, ProbeSignals,
    SecurityContext, ServerCategory, ServerDescriptor, Transport,
};
use owl_core::registry::{DirectoryCacheStatus, DirectorySource, SearchFilters};
use owl_core::ServerRegistryService;

use crate::host::{AuthSurface, ConfigScope, ConfigStore};

const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryResponse {
    pub success: bool,
    pub servers: Vec<ServerDescriptor>,
    pub source: DirectorySource,
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub servers: Vec<ServerDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestConnectionResponse {
    /// Mirrors `result.success` for one-glance rendering
    pub success: bool,
    pub result: ConnectionTestResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerTestOutcome {
    pub server_id: String,
    pub result: ConnectionTestResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestAllResponse {
    pub results: Vec<ServerTestOutcome>,
}

/// Incremental progress for the sequential test-all convenience.
#[derive(Debug, Clone, Serialize)]
pub struct TestProgress {
    /// 1-based index of the server currently being tested
    pub current: usize,
    pub total: usize,
    pub server_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// The boundary object the host application holds.
pub struct OwlBridge {
    registry: Arc<ServerRegistryService>,
    discovery: AuthDiscovery,
    config: Arc<dyn ConfigStore>,
    auth_surface: Arc<dyn AuthSurface>,
    /// Signals from the most recent connection test per server id, so later
    /// detail requests reflect the observed TLS state
    probe_signals: RwLock<HashMap<String, ProbeSignals>>,
}

impl OwlBridge {
    /// Build the bridge. `data_dir` roots the directory cache;
    /// `directory_api` enables live directory fetching when present.
    pub fn new(
        data_dir: PathBuf,
        directory_api: Option<String>,
        config: Arc<dyn ConfigStore>,
        auth_surface: Arc<dyn AuthSurface>,
    ) -> Self {
        let prober = Arc::new(ConnectionProber::new());
        let mut registry = ServerRegistryService::new(data_dir).with_connection_tester(prober);
        if let Some(base_url) = directory_api {
            registry = registry.with_directory_api(base_url);
        }

        Self {
            registry: Arc::new(registry),
            discovery: AuthDiscovery::new(),
            config,
            auth_surface,
            probe_signals: RwLock::new(HashMap::new()),
        }
    }

    /// Access to the underlying registry (e.g. for tests or background refresh).
    pub fn registry(&self) -> &Arc<ServerRegistryService> {
        &self.registry
    }

    /// Fetch the server directory, optionally filtered.
    pub async fn fetch_directory(
        &self,
        force_refresh: bool,
        filters: Option<&SearchFilters>,
    ) -> DirectoryResponse {
        let view = self.registry.fetch_directory(force_refresh).await;
        let servers = match filters {
            Some(filters) => self.registry.search(filters).await,
            None => view.servers,
        };
        DirectoryResponse {
            success: true,
            servers,
            source: view.source,
            last_updated: view.last_updated,
            error: None,
        }
    }

    /// Search the directory. No matches is an empty list, not an error.
    pub async fn search_servers(
        &self,
        query: Option<String>,
        category: Option<ServerCategory>,
        auth_type: Option<AuthType>,
    ) -> SearchResponse {
        let filters = SearchFilters {
            search: query,
            category,
            auth_type,
            verified_only: false,
        };
        SearchResponse {
            success: true,
            servers: self.registry.search(&filters).await,
            error: None,
        }
    }

    /// Per-server detail with security context. Incorporates signals from
    /// the most recent connection test of this server, when one has run.
    /// Unknown ids are a soft error.
    pub async fn get_server_details(&self, server_id: &str) -> DetailsResponse {
        let signals = self
            .probe_signals
            .read()
            .await
            .get(server_id)
            .copied()
            .unwrap_or_default();

        match self
            .registry
            .server_details_with_signals(server_id, &signals)
            .await
        {
            Some(details) => DetailsResponse {
                success: true,
                server: Some(details.server),
                security_context: Some(details.security_context),
                error: None,
            },
            None => DetailsResponse {
                success: false,
                server: None,
                security_context: None,
                error: Some(format!("server not found: {}", server_id)),
            },
        }
    }

    /// Run one connection test.
    pub async fn test_connection(
        &self,
        url: &str,
        transport: Transport,
        timeout_ms: Option<u64>,
    ) -> TestConnectionResponse {
        let timeout = timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TEST_TIMEOUT);

        match self
            .registry
            .test_remote_connection(url, transport, timeout)
            .await
        {
            Ok(result) => {
                self.remember_signals(url, &result).await;
                TestConnectionResponse {
                    success: result.success,
                    error: result.error.clone(),
                    result,
                }
            }
            // Only reachable if the bridge was built without a prober
            Err(e) => TestConnectionResponse {
                success: false,
                error: Some(e.to_string()),
                result: ConnectionTestResult::failed(
                    ConnectionErrorCode::NetworkError,
                    e.to_string(),
                    Vec::new(),
                    Vec::new(),
                ),
            },
        }
    }

    /// Test servers one at a time, reporting incremental progress so callers
    /// can render it without managing concurrency themselves.
    pub async fn test_all_connections(
        &self,
        server_ids: &[String],
        progress: Option<&(dyn Fn(TestProgress) + Send + Sync)>,
    ) -> TestAllResponse {
        let total = server_ids.len();
        let mut results = Vec::with_capacity(total);

        for (index, server_id) in server_ids.iter().enumerate() {
            if let Some(report) = progress {
                report(TestProgress {
                    current: index + 1,
                    total,
                    server_id: server_id.clone(),
                });
            }

            let result = match self.registry.server_details(server_id).await {
                Some(details) => {
                    let response = self
                        .test_connection(&details.server.endpoint, details.server.transport, None)
                        .await;
                    response.result
                }
                None => {
                    warn!("test_all_connections: unknown server id {}", server_id);
                    ConnectionTestResult::failed(
                        ConnectionErrorCode::NetworkError,
                        format!("unknown server id: {}", server_id),
                        Vec::new(),
                        Vec::new(),
                    )
                }
            };

            results.push(ServerTestOutcome {
                server_id: server_id.clone(),
                result,
            });
        }

        TestAllResponse { results }
    }

    /// Record probe signals for whichever directory entry uses this
    /// endpoint. Tests addressed by raw URL with no directory counterpart
    /// leave the signal map untouched.
    async fn remember_signals(&self, endpoint_url: &str, result: &ConnectionTestResult) {
        let view = self.registry.fetch_directory(false).await;
        let Some(server) = view.servers.iter().find(|s| s.endpoint == endpoint_url) else {
            return;
        };
        self.probe_signals
            .write()
            .await
            .insert(server.id.clone(), ProbeSignals::from_test_result(result));
    }

    /// Probe a server's auth metadata. Fails soft (see `AuthDiscovery`).
    pub async fn discover_auth(
        &self,
        endpoint: &str,
        declared: AuthType,
    ) -> DiscoverAuthResponse {
        self.discovery.discover(endpoint, declared).await
    }

    /// Add a server entry via the host configuration store.
    pub async fn add_remote_server(
        &self,
        server: &ServerDescriptor,
        scope: ConfigScope,
        project_path: Option<&Path>,
        custom_name: Option<&str>,
    ) -> ActionResponse {
        match self
            .config
            .add_remote_server(server, scope, project_path, custom_name)
            .await
        {
            Ok(()) => ActionResponse::ok(format!(
                "Added {}",
                custom_name.unwrap_or(&server.name)
            )),
            Err(e) => ActionResponse::err(format!("Failed to add server: {}", e)),
        }
    }

    /// Validate and persist API-key credentials via the host store. The
    /// credentials are consumed and zeroized when this returns.
    pub async fn configure_api_key(
        &self,
        server: &ServerDescriptor,
        credentials: ApiKeyCredentials,
        scope: ConfigScope,
        project_path: Option<&Path>,
    ) -> ActionResponse {
        if let Err(e) = credentials.validate() {
            return ActionResponse::err(e.to_string());
        }

        match self
            .config
            .store_api_key(server, &credentials, scope, project_path)
            .await
        {
            Ok(()) => ActionResponse::ok(format!("Configured credentials for {}", server.name)),
            Err(e) => ActionResponse::err(format!("Failed to store credentials: {}", e)),
        }
    }

    /// Hand off to the external OAuth authentication surface.
    pub async fn launch_oauth_flow(
        &self,
        server_name: &str,
        server_url: &str,
        transport: Transport,
        project_path: Option<&Path>,
    ) -> ActionResponse {
        match self
            .auth_surface
            .launch_oauth(server_name, server_url, transport, project_path)
            .await
        {
            Ok(()) => ActionResponse::ok(format!("Authentication started for {}", server_name)),
            Err(e) => ActionResponse::err(format!("Failed to launch authentication: {}", e)),
        }
    }

    pub async fn get_cache_status(&self) -> DirectoryCacheStatus {
        self.registry.cache_status().await
    }

    /// Start an auth negotiation flow for `server`, wired to the host
    /// collaborators at the given scope.
    pub fn negotiation_flow(
        &self,
        server: ServerDescriptor,
        scope: ConfigScope,
        project_path: Option<PathBuf>,
    ) -> NegotiationFlow {
        let host = Arc::new(BridgeNegotiationHost {
            config: self.config.clone(),
            auth_surface: self.auth_surface.clone(),
            scope,
            project_path,
        });
        NegotiationFlow::new(server, host)
    }
}

/// Adapts the bridge collaborators to the negotiation flow's host trait.
struct BridgeNegotiationHost {
    config: Arc<dyn ConfigStore>,
    auth_surface: Arc<dyn AuthSurface>,
    scope: ConfigScope,
    project_path: Option<PathBuf>,
}

#[async_trait::async_trait]
impl NegotiationHost for BridgeNegotiationHost {
    async fn add_server(
        &self,
        server: &ServerDescriptor,
        custom_name: Option<&str>,
    ) -> anyhow::Result<()> {
        self.config
            .add_remote_server(server, self.scope, self.project_path.as_deref(), custom_name)
            .await
    }

    async fn configure_api_key(
        &self,
        server: &ServerDescriptor,
        credentials: &ApiKeyCredentials,
    ) -> anyhow::Result<()> {
        self.config
            .store_api_key(server, credentials, self.scope, self.project_path.as_deref())
            .await
    }

    async fn launch_oauth(&self, server: &ServerDescriptor) -> anyhow::Result<()> {
        self.auth_surface
            .launch_oauth(
                &server.name,
                &server.endpoint,
                server.transport,
                self.project_path.as_deref(),
            )
            .await
    }
}
