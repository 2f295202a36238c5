//! # Claude Owl Core Library
//!
//! Domain logic for remote MCP server discovery and verification.
//!
//! ## Modules
//!
//! - `domain` - Core entities (ServerDescriptor, SecurityContext, ConnectionTestResult)
//! - `registry` - Server directory: curated list, disk cache, live client, registry service
//! - `risk` - Pure security risk assessment over server descriptors

pub mod domain;
pub mod registry;
pub mod risk;

// Re-export commonly used types
pub use domain::*;
pub use registry::{
    DirectoryCacheStatus, DirectoryCacheStore, DirectoryClient, DirectoryView, SearchFilters,
    ServerDetails, ServerRegistryService,
};
pub use risk::{assess, RiskPolicy};

use std::path::PathBuf;

/// Default application data directory (e.g. `~/.local/share/claude-owl`).
///
/// Callers may override this entirely; nothing in the core reads it implicitly.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("claude-owl")
}
