//! Host collaborator traits.
//!
//! The core never writes configuration files or secret stores itself; it
//! delegates to these boundaries, which the host application implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use owl_connect::ApiKeyCredentials;
use owl_core::domain::{ServerDescriptor, Transport};

/// Which configuration level a server is written to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConfigScope {
    /// User-level configuration
    #[default]
    User,
    /// Project-local configuration (requires a project path)
    Project,
}

/// Persistence boundary for server entries and credentials.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Add a remote server entry to the host configuration.
    async fn add_remote_server(
        &self,
        server: &ServerDescriptor,
        scope: ConfigScope,
        project_path: Option<&Path>,
        custom_name: Option<&str>,
    ) -> anyhow::Result<()>;

    /// Store an API key for a server. Implementations own secret storage;
    /// the credentials are dropped (and zeroized) after this returns.
    async fn store_api_key(
        &self,
        server: &ServerDescriptor,
        credentials: &ApiKeyCredentials,
        scope: ConfigScope,
        project_path: Option<&Path>,
    ) -> anyhow::Result<()>;
}

/// External authentication surface (the host CLI's own OAuth UI).
#[async_trait]
pub trait AuthSurface: Send + Sync {
    async fn launch_oauth(
        &self,
        server_name: &str,
        server_url: &str,
        transport: Transport,
        project_path: Option<&Path>,
    ) -> anyhow::Result<()>;
}
