//! Live directory fetch, ETag revalidation, and fallback behavior.

use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use owl_core::domain::AuthSpec;
use owl_core::registry::DirectorySource;
use owl_core::ServerRegistryService;
use tests::fixtures::{listing_json, open_server, test_server};

fn service(dir: &TempDir, api_url: &str) -> ServerRegistryService {
    ServerRegistryService::new(dir.path().to_path_buf())
        .with_directory_api(api_url.to_string())
}

#[tokio::test]
async fn test_live_fetch_merges_over_curated() {
    tests::init_tracing();
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Live listing: one new server plus an override of a curated entry
    let mut github_override = test_server(
        "github-mcp",
        "https://api.githubcopilot.com/mcp/",
        AuthSpec::Oauth {
            provider: Some("github".to_string()),
            scopes: vec!["repo".to_string()],
        },
    );
    github_override.name = "GitHub (updated)".to_string();
    let fresh = open_server("fresh-mcp", "https://fresh.example.com/mcp");

    Mock::given(method("GET"))
        .and(path("/v1/servers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(listing_json(&[github_override.clone(), fresh.clone()])),
        )
        .mount(&mock_server)
        .await;

    let service = service(&dir, &mock_server.uri());
    let view = service.fetch_directory(false).await;

    assert_eq!(view.source, DirectorySource::Live);
    assert!(view.last_updated.is_some());

    // New live server is present
    assert!(view.servers.iter().any(|s| s.id == "fresh-mcp"));
    // Live entry overrides the curated one with the same id
    let github = view.servers.iter().find(|s| s.id == "github-mcp").unwrap();
    assert_eq!(github.name, "GitHub (updated)");
    // Curated-only servers survive the merge
    assert!(view.servers.iter().any(|s| s.id == "notion-mcp"));

    // Deterministic ordering
    let mut ids: Vec<_> = view.servers.iter().map(|s| s.id.clone()).collect();
    let sorted = {
        let mut v = ids.clone();
        v.sort();
        v
    };
    assert_eq!(ids, sorted);
    ids.dedup();
    assert_eq!(ids.len(), view.servers.len());
}

#[tokio::test]
async fn test_etag_revalidation_serves_cache_on_304() {
    tests::init_tracing();
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let fresh = open_server("fresh-mcp", "https://fresh.example.com/mcp");

    // A conditional request with the stored ETag gets 304. Mounted first so
    // it wins when the header is present.
    Mock::given(method("GET"))
        .and(path("/v1/servers"))
        .and(header("If-None-Match", "\"v1\""))
        .respond_with(ResponseTemplate::new(304))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/servers"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("etag", "\"v1\"")
                .set_body_json(listing_json(std::slice::from_ref(&fresh))),
        )
        .mount(&mock_server)
        .await;

    let service = service(&dir, &mock_server.uri());

    // First fetch stores the listing and its ETag
    let first = service.fetch_directory(true).await;
    assert_eq!(first.source, DirectorySource::Live);
    assert!(first.servers.iter().any(|s| s.id == "fresh-mcp"));

    // Forced refresh revalidates; 304 means the cache is still current
    let second = service.fetch_directory(true).await;
    assert_eq!(second.source, DirectorySource::Live);
    assert_eq!(first.servers, second.servers);
}

#[tokio::test]
async fn test_fetch_failure_falls_back_to_last_good_cache() {
    tests::init_tracing();
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let fresh = open_server("fresh-mcp", "https://fresh.example.com/mcp");
    Mock::given(method("GET"))
        .and(path("/v1/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_json(&[fresh])))
        .mount(&mock_server)
        .await;

    let service = service(&dir, &mock_server.uri());
    let live = service.fetch_directory(true).await;
    assert_eq!(live.source, DirectorySource::Live);

    // Directory API starts failing
    mock_server.reset().await;
    Mock::given(method("GET"))
        .and(path("/v1/servers"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    // Forced refresh degrades to the last good cache, never an error
    let degraded = service.fetch_directory(true).await;
    assert_eq!(degraded.source, DirectorySource::Cache);
    assert_eq!(live.servers, degraded.servers);
}

#[tokio::test]
async fn test_disk_cache_survives_restart() {
    tests::init_tracing();
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let fresh = open_server("fresh-mcp", "https://fresh.example.com/mcp");
    Mock::given(method("GET"))
        .and(path("/v1/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_json(&[fresh])))
        .mount(&mock_server)
        .await;

    let first_session = service(&dir, &mock_server.uri());
    first_session.fetch_directory(true).await;

    // A new service over the same data dir, with no network configured,
    // serves the previously fetched listing from disk.
    let second_session = ServerRegistryService::new(dir.path().to_path_buf());
    let view = second_session.fetch_directory(false).await;

    assert_eq!(view.source, DirectorySource::Cache);
    assert!(view.servers.iter().any(|s| s.id == "fresh-mcp"));

    let status = second_session.cache_status().await;
    assert!(status.is_cached);
    assert!(!status.is_stale);
    assert_eq!(status.server_count, 1);
}

#[tokio::test]
async fn test_stale_cache_is_flagged_but_still_served() {
    tests::init_tracing();
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let fresh = open_server("fresh-mcp", "https://fresh.example.com/mcp");
    Mock::given(method("GET"))
        .and(path("/v1/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_json(&[fresh])))
        .mount(&mock_server)
        .await;

    let writer = service(&dir, &mock_server.uri());
    writer.fetch_directory(true).await;

    // Tiny TTL makes the just-written cache immediately stale
    tokio::time::sleep(Duration::from_millis(10)).await;
    let reader = ServerRegistryService::new(dir.path().to_path_buf())
        .with_cache_ttl(Duration::from_millis(1));

    let status = reader.cache_status().await;
    assert!(status.is_cached);
    assert!(status.is_stale);

    // Staleness never blocks a read
    let view = reader.fetch_directory(false).await;
    assert!(view.servers.iter().any(|s| s.id == "fresh-mcp"));
}
