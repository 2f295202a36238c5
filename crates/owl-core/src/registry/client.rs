//! HTTP client for fetching the live server directory.
//!
//! Supports ETag-based conditional fetching to avoid re-downloading an
//! unchanged listing. All filtering and searching is done client-side
//! against the merged directory.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::ServerDescriptor;

/// Listing document served at `/v1/servers`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectoryListing {
    pub servers: Vec<ServerDescriptor>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result of fetching the listing with ETag support.
#[derive(Debug)]
pub enum FetchListingResult {
    /// New or updated listing received
    Updated {
        listing: DirectoryListing,
        etag: Option<String>,
    },
    /// Listing unchanged (304 Not Modified)
    NotModified,
}

/// Client for the hosted server directory.
pub struct DirectoryClient {
    base_url: String,
    client: reqwest::Client,
}

impl DirectoryClient {
    /// Create a new directory client.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("ClaudeOwl/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self { base_url, client }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the server listing from `/v1/servers`.
    ///
    /// If `current_etag` is provided, sends `If-None-Match` and returns
    /// `NotModified` when the server responds with 304.
    pub async fn fetch_listing(&self, current_etag: Option<&str>) -> Result<FetchListingResult> {
        let url = format!("{}/v1/servers", self.base_url.trim_end_matches('/'));

        tracing::info!("Fetching server directory from {}", url);

        let mut request = self.client.get(&url);
        if let Some(etag) = current_etag {
            tracing::debug!("Sending If-None-Match: {}", etag);
            request = request.header("If-None-Match", etag);
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to directory API")?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_MODIFIED {
            tracing::info!("Server directory not modified (304)");
            return Ok(FetchListingResult::NotModified);
        }

        if !status.is_success() {
            anyhow::bail!("Directory API returned status: {}", status);
        }

        let etag = response
            .headers()
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let listing: DirectoryListing = response
            .json()
            .await
            .context("Failed to parse server directory JSON")?;

        tracing::info!(
            "Fetched {} servers (updated {:?}, etag: {:?})",
            listing.servers.len(),
            listing.updated_at,
            etag
        );

        Ok(FetchListingResult::Updated { listing, etag })
    }
}
