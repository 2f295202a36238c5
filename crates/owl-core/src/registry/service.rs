//! Registry service: owns the merged server directory and its freshness.
//!
//! Refresh is all-or-nothing: the in-memory view is read-then-replaced,
//! never merged field-by-field. A failed live fetch is never surfaced as an
//! error, only as `source: cache`.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::{
    AuthType, ConnectionTestResult, ConnectionTester, ProbeSignals, SecurityContext,
    ServerCategory, ServerDescriptor, Transport,
};
use crate::registry::cache::{DirectoryCacheStatus, DirectoryCacheStore, DirectorySource};
use crate::registry::client::{DirectoryClient, FetchListingResult};
use crate::registry::curated::builtin_servers;
use crate::risk::{assess, RiskPolicy};

/// Snapshot of the directory returned to callers.
#[derive(Debug, Clone)]
pub struct DirectoryView {
    pub servers: Vec<ServerDescriptor>,
    pub source: DirectorySource,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Composable search filters. Absent filters are no-ops; present filters
/// compose with logical AND.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Case-insensitive substring match against name, description, provider,
    /// and tags
    pub search: Option<String>,
    pub category: Option<ServerCategory>,
    pub auth_type: Option<AuthType>,
    pub verified_only: bool,
}

/// Per-server detail with a freshly computed security context.
#[derive(Debug, Clone)]
pub struct ServerDetails {
    pub server: ServerDescriptor,
    pub security_context: SecurityContext,
}

struct DirectoryState {
    servers: Vec<ServerDescriptor>,
    source: DirectorySource,
    last_updated: Option<DateTime<Utc>>,
}

/// Owns the curated/live server list and orchestrates connection tests.
pub struct ServerRegistryService {
    curated: Vec<ServerDescriptor>,
    state: Arc<RwLock<Option<DirectoryState>>>,
    cache: DirectoryCacheStore,
    client: Option<DirectoryClient>,
    tester: Option<Arc<dyn ConnectionTester>>,
    policy: RiskPolicy,
}

impl ServerRegistryService {
    /// Create a service storing its cache under `data_dir`.
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            curated: builtin_servers(),
            state: Arc::new(RwLock::new(None)),
            cache: DirectoryCacheStore::new(data_dir),
            client: None,
            tester: None,
            policy: RiskPolicy::default(),
        }
    }

    /// Enable live directory fetching.
    pub fn with_directory_api(mut self, base_url: String) -> Self {
        self.client = Some(DirectoryClient::new(base_url));
        self
    }

    /// Inject the connection prober.
    pub fn with_connection_tester(mut self, tester: Arc<dyn ConnectionTester>) -> Self {
        self.tester = Some(tester);
        self
    }

    /// Override risk-scoring policy.
    pub fn with_risk_policy(mut self, policy: RiskPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the cache staleness TTL (mainly for tests).
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = self.cache.with_ttl(ttl);
        self
    }

    /// Fetch the directory.
    ///
    /// Without `force_refresh`, prefers the in-memory view, then the disk
    /// cache, and only touches the network when neither exists. With
    /// `force_refresh`, always attempts a live fetch and falls back to the
    /// last good cache (or curated-only) on failure.
    pub async fn fetch_directory(&self, force_refresh: bool) -> DirectoryView {
        if !force_refresh {
            if let Some(view) = self.current_view().await {
                return view;
            }

            if let Some(cache) = self.cache.load().await {
                return self
                    .replace_state(
                        self.merge(cache.servers),
                        DirectorySource::Cache,
                        Some(cache.last_updated),
                    )
                    .await;
            }
        }

        self.refresh_live().await
    }

    async fn current_view(&self) -> Option<DirectoryView> {
        let state = self.state.read().await;
        state.as_ref().map(|s| DirectoryView {
            servers: s.servers.clone(),
            source: s.source,
            last_updated: s.last_updated,
        })
    }

    async fn replace_state(
        &self,
        servers: Vec<ServerDescriptor>,
        source: DirectorySource,
        last_updated: Option<DateTime<Utc>>,
    ) -> DirectoryView {
        let view = DirectoryView {
            servers: servers.clone(),
            source,
            last_updated,
        };
        let mut state = self.state.write().await;
        *state = Some(DirectoryState {
            servers,
            source,
            last_updated,
        });
        view
    }

    /// Attempt a live fetch, falling back to cache then curated-only.
    async fn refresh_live(&self) -> DirectoryView {
        let Some(client) = &self.client else {
            return self.fallback("no directory API configured").await;
        };

        // Only send the ETag when a cache file exists, otherwise a 304 would
        // leave us with nothing to serve.
        let cached = self.cache.load().await;
        let etag = cached.as_ref().and_then(|c| c.etag.clone());

        match client.fetch_listing(etag.as_deref()).await {
            Ok(FetchListingResult::Updated { listing, etag }) => {
                let last_updated = listing.updated_at.unwrap_or_else(Utc::now);
                if let Err(e) = self
                    .cache
                    .save(&listing.servers, last_updated, etag)
                    .await
                {
                    warn!("Failed to save directory cache: {}", e);
                }
                self.replace_state(
                    self.merge(listing.servers),
                    DirectorySource::Live,
                    Some(last_updated),
                )
                .await
            }
            Ok(FetchListingResult::NotModified) => match cached {
                Some(cache) => {
                    info!("Directory unchanged, serving validated cache");
                    self.replace_state(
                        self.merge(cache.servers),
                        DirectorySource::Live,
                        Some(cache.last_updated),
                    )
                    .await
                }
                None => self.fallback("304 with no cache on disk").await,
            },
            Err(e) => {
                warn!("Live directory fetch failed: {}", e);
                self.fallback("live fetch failed").await
            }
        }
    }

    /// Degraded path: last good cache if present, otherwise curated-only.
    async fn fallback(&self, reason: &str) -> DirectoryView {
        info!("Serving directory from fallback ({})", reason);
        match self.cache.load().await {
            Some(cache) => {
                let last_updated = cache.last_updated;
                self.replace_state(
                    self.merge(cache.servers),
                    DirectorySource::Cache,
                    Some(last_updated),
                )
                .await
            }
            None => {
                self.replace_state(self.merge(Vec::new()), DirectorySource::Cache, None)
                    .await
            }
        }
    }

    /// Merge curated built-ins with live/cached servers; live entries
    /// override curated ones by id. Sorted by id for deterministic output.
    fn merge(&self, live: Vec<ServerDescriptor>) -> Vec<ServerDescriptor> {
        let mut merged: HashMap<String, ServerDescriptor> = self
            .curated
            .iter()
            .map(|s| (s.id.clone(), s.clone()))
            .collect();
        for server in live {
            merged.insert(server.id.clone(), server);
        }
        let mut servers: Vec<_> = merged.into_values().collect();
        servers.sort_by(|a, b| a.id.cmp(&b.id));
        servers
    }

    /// Search the current directory. Returns an empty list for no matches.
    pub async fn search(&self, filters: &SearchFilters) -> Vec<ServerDescriptor> {
        let view = self.fetch_directory(false).await;
        view.servers
            .into_iter()
            .filter(|server| Self::matches(server, filters))
            .collect()
    }

    fn matches(server: &ServerDescriptor, filters: &SearchFilters) -> bool {
        if let Some(query) = &filters.search {
            let query = query.to_lowercase();
            let hit = server.name.to_lowercase().contains(&query)
                || server
                    .description
                    .as_ref()
                    .is_some_and(|d| d.to_lowercase().contains(&query))
                || server.provider.name.to_lowercase().contains(&query)
                || server
                    .tags
                    .iter()
                    .any(|t| t.to_lowercase().contains(&query));
            if !hit {
                return false;
            }
        }

        if let Some(category) = &filters.category {
            if server.category != *category {
                return false;
            }
        }

        if let Some(auth_type) = filters.auth_type {
            if server.auth_type() != auth_type {
                return false;
            }
        }

        if filters.verified_only && !server.verified {
            return false;
        }

        true
    }

    /// Per-server detail with a security context computed from unprobed
    /// signals. Unknown id yields `None`, not an error.
    pub async fn server_details(&self, server_id: &str) -> Option<ServerDetails> {
        self.server_details_with_signals(server_id, &ProbeSignals::default())
            .await
    }

    /// Per-server detail incorporating probe results (e.g. TLS validity).
    pub async fn server_details_with_signals(
        &self,
        server_id: &str,
        signals: &ProbeSignals,
    ) -> Option<ServerDetails> {
        let view = self.fetch_directory(false).await;
        let server = view.servers.into_iter().find(|s| s.id == server_id)?;
        let security_context = assess(&server, signals, &self.policy);
        Some(ServerDetails {
            server,
            security_context,
        })
    }

    /// Run a connection test through the injected prober.
    ///
    /// Expected network failures come back as a structured result; only a
    /// missing prober (programmer error) returns `Err`.
    pub async fn test_remote_connection(
        &self,
        endpoint_url: &str,
        transport: Transport,
        timeout: Duration,
    ) -> anyhow::Result<ConnectionTestResult> {
        let tester = self
            .tester
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no connection tester configured"))?;
        Ok(tester.test(endpoint_url, transport, timeout).await)
    }

    /// Disk cache freshness summary.
    pub async fn cache_status(&self) -> DirectoryCacheStatus {
        self.cache.status().await
    }

    /// Distinct categories in the current directory, deterministic order.
    pub async fn categories(&self) -> Vec<String> {
        let view = self.fetch_directory(false).await;
        let mut categories: Vec<String> = view
            .servers
            .iter()
            .map(|s| s.category.as_str().to_string())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }
}
