//! Remote MCP server directory.
//!
//! The directory is assembled from a curated built-in list merged with an
//! optional live listing, cached to disk between sessions.

mod cache;
mod client;
mod curated;
mod service;

pub use cache::{DirectoryCacheFile, DirectoryCacheStatus, DirectoryCacheStore, DirectorySource};
pub use client::{DirectoryClient, DirectoryListing, FetchListingResult};
pub use curated::builtin_servers;
pub use service::{DirectoryView, SearchFilters, ServerDetails, ServerRegistryService};
