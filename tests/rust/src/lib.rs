//! Shared test utilities and fixtures for Claude Owl integration tests.

pub use owl_core::domain::{
    AuthSpec, AuthType, ProviderInfo, ServerCategory, ServerDescriptor, Transport,
};


/// Server descriptor fixtures
pub mod fixtures {
    use super::*;

    /// Create a verified test server with the given auth spec.
    pub fn test_server(id: &str, endpoint: &str, auth: AuthSpec) -> ServerDescriptor {
        ServerDescriptor {
            id: id.to_string(),
            name: format!("Test {}", id),
            description: Some(format!("Integration test fixture for {}", id)),
            provider: ProviderInfo {
                name: "Test Provider".to_string(),
                domain: Some("test.example.com".to_string()),
                official: true,
            },
            endpoint: endpoint.to_string(),
            transport: Transport::Http,
            auth,
            verified: true,
            category: ServerCategory::DeveloperTools,
            tags: vec!["test".to_string()],
            logo_url: None,
            documentation_url: None,
        }
    }

    /// Create an open (no-auth) test server.
    pub fn open_server(id: &str, endpoint: &str) -> ServerDescriptor {
        test_server(id, endpoint, AuthSpec::Open)
    }

    /// Listing document as served by the directory API.
    pub fn listing_json(servers: &[ServerDescriptor]) -> serde_json::Value {
        serde_json::json!({
            "servers": servers,
            "updated_at": chrono::Utc::now(),
        })
    }
}

/// Tracing setup for test debugging (honors RUST_LOG)
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
