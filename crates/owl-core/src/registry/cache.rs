//! Disk cache for the server directory.
//!
//! A cache read never blocks on network, and a corrupt or missing file is
//! treated as "no cache" rather than an error: the registry service falls
//! back to the curated built-in list. Saves replace the whole file, so
//! concurrent refreshes cannot produce torn state (last writer wins).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::ServerDescriptor;

const CACHE_FILENAME: &str = "server-directory.json";

/// Default staleness TTL. Staleness only makes a background refresh
/// recommended; it never blocks a cached read.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Where the directory servers came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DirectorySource {
    /// Fresh live fetch (or a 304-validated cache)
    Live,
    /// Disk cache or curated-only fallback
    Cache,
}

/// Persisted cache document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryCacheFile {
    pub servers: Vec<ServerDescriptor>,
    pub last_updated: DateTime<Utc>,
    /// ETag from the last successful live fetch, for conditional refresh
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// Freshness summary for callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryCacheStatus {
    pub is_cached: bool,
    pub is_stale: bool,
    pub server_count: usize,
}

/// File-backed store for the directory cache.
pub struct DirectoryCacheStore {
    data_dir: PathBuf,
    ttl: Duration,
}

impl DirectoryCacheStore {
    /// Create a store rooted at `data_dir` (injected, never a global).
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Override the staleness TTL (mainly for tests).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn cache_path(&self) -> PathBuf {
        self.data_dir.join("cache").join(CACHE_FILENAME)
    }

    /// Load the cached directory. Missing or unparsable files yield `None`.
    pub async fn load(&self) -> Option<DirectoryCacheFile> {
        let path = self.cache_path();

        if !path.exists() {
            return None;
        }

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<DirectoryCacheFile>(&content) {
                Ok(cache) => {
                    info!(
                        "Loaded directory cache: {} servers (updated {})",
                        cache.servers.len(),
                        cache.last_updated
                    );
                    Some(cache)
                }
                Err(e) => {
                    warn!("Failed to parse cached directory: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read cached directory: {}", e);
                None
            }
        }
    }

    /// Replace the cache wholesale after a successful live fetch.
    pub async fn save(
        &self,
        servers: &[ServerDescriptor],
        last_updated: DateTime<Utc>,
        etag: Option<String>,
    ) -> anyhow::Result<()> {
        let cache_dir = self.data_dir.join("cache");
        if !cache_dir.exists() {
            tokio::fs::create_dir_all(&cache_dir).await?;
        }

        let cache = DirectoryCacheFile {
            servers: servers.to_vec(),
            last_updated,
            etag,
        };

        let path = self.cache_path();
        let json = serde_json::to_string_pretty(&cache)?;
        tokio::fs::write(&path, json).await?;

        info!("Saved directory cache: {}", path.display());
        Ok(())
    }

    /// Freshness summary. Stale means older than the TTL.
    pub async fn status(&self) -> DirectoryCacheStatus {
        match self.load().await {
            Some(cache) => {
                let age = Utc::now().signed_duration_since(cache.last_updated);
                let is_stale = age.to_std().map(|age| age > self.ttl).unwrap_or(false);
                DirectoryCacheStatus {
                    is_cached: true,
                    is_stale,
                    server_count: cache.servers.len(),
                }
            }
            None => DirectoryCacheStatus {
                is_cached: false,
                is_stale: false,
                server_count: 0,
            },
        }
    }
}
