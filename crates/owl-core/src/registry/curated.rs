//! Curated built-in directory, bundled with the application.
//!
//! The registry service always has these to fall back on, even with no
//! network and no cache.

use serde::Deserialize;

use crate::domain::ServerDescriptor;

const CURATED_JSON: &str = include_str!("curated.json");

#[derive(Deserialize)]
struct CuratedFile {
    servers: Vec<ServerDescriptor>,
}

/// The curated built-in server list.
pub fn builtin_servers() -> Vec<ServerDescriptor> {
    let file: CuratedFile =
        serde_json::from_str(CURATED_JSON).expect("bundled curated.json is valid");
    file.servers
}
