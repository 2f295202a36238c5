//! Auth-metadata discovery against mock `.well-known` endpoints.

use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use owl_connect::AuthDiscovery;
use owl_core::domain::{AuthType, DiscoveredAuthType};

async fn mount_protected_resource(mock_server: &MockServer, issuer: &str, scopes: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-protected-resource"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "resource": mock_server.uri(),
            "resource_name": "Test MCP Server",
            "authorization_servers": [issuer],
            "scopes_supported": scopes,
        })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_dcr_support_is_discovered() {
    tests::init_tracing();
    let mock_server = MockServer::start().await;
    mount_protected_resource(&mock_server, &mock_server.uri(), &["repo", "read:user"]).await;

    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-authorization-server"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "issuer": mock_server.uri(),
            "authorization_endpoint": format!("{}/authorize", mock_server.uri()),
            "token_endpoint": format!("{}/token", mock_server.uri()),
            "registration_endpoint": format!("{}/register", mock_server.uri()),
        })))
        .mount(&mock_server)
        .await;

    let discovery = AuthDiscovery::new();
    let endpoint = format!("{}/mcp", mock_server.uri());
    let response = discovery.discover(&endpoint, AuthType::Oauth).await;

    assert_eq!(response.auth_type, DiscoveredAuthType::OauthDcr);
    assert!(response.supports_dcr);
    assert_eq!(response.scopes, vec!["repo", "read:user"]);
    assert_eq!(response.protected_resource.as_deref(), Some("Test MCP Server"));
    assert!(response.error.is_none());
}

#[tokio::test]
async fn test_oauth_without_registration_endpoint_is_static() {
    tests::init_tracing();
    let mock_server = MockServer::start().await;
    mount_protected_resource(&mock_server, &mock_server.uri(), &[]).await;

    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-authorization-server"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "issuer": mock_server.uri(),
            "authorization_endpoint": format!("{}/authorize", mock_server.uri()),
            "token_endpoint": format!("{}/token", mock_server.uri()),
            "scopes_supported": ["mcp.read"],
        })))
        .mount(&mock_server)
        .await;

    let discovery = AuthDiscovery::new();
    let endpoint = format!("{}/mcp", mock_server.uri());
    let response = discovery.discover(&endpoint, AuthType::Oauth).await;

    assert_eq!(response.auth_type, DiscoveredAuthType::OauthStatic);
    assert!(!response.supports_dcr);
    // Scopes fall back to the authorization server's advertisement
    assert_eq!(response.scopes, vec!["mcp.read"]);
}

#[tokio::test]
async fn test_oidc_discovery_fallback() {
    tests::init_tracing();
    let mock_server = MockServer::start().await;

    // No RFC 8414 document; OIDC discovery has one with DCR
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "issuer": mock_server.uri(),
            "registration_endpoint": format!("{}/register", mock_server.uri()),
        })))
        .mount(&mock_server)
        .await;

    let discovery = AuthDiscovery::new();
    let endpoint = format!("{}/mcp", mock_server.uri());
    let response = discovery.discover(&endpoint, AuthType::Oauth).await;

    assert_eq!(response.auth_type, DiscoveredAuthType::OauthDcr);
    assert!(response.supports_dcr);
}

#[tokio::test]
async fn test_no_metadata_echoes_declared_type_cleanly() {
    tests::init_tracing();
    // Everything 404s by default
    let mock_server = MockServer::start().await;
    let discovery = AuthDiscovery::new();
    let endpoint = format!("{}/mcp", mock_server.uri());

    let api_key = discovery.discover(&endpoint, AuthType::ApiKey).await;
    assert_eq!(api_key.auth_type, DiscoveredAuthType::ApiKey);
    assert!(api_key.error.is_none());

    let open = discovery.discover(&endpoint, AuthType::Open).await;
    assert_eq!(open.auth_type, DiscoveredAuthType::Open);

    // Declared OAuth with no metadata means DCR cannot be assumed
    let oauth = discovery.discover(&endpoint, AuthType::Oauth).await;
    assert_eq!(oauth.auth_type, DiscoveredAuthType::OauthStatic);
    assert!(!oauth.supports_dcr);
}

#[tokio::test]
async fn test_unreachable_server_fails_soft_with_error() {
    tests::init_tracing();
    // Stop listening so requests are refused. An exclusive server is
    // required: pooled servers keep listening after drop.
    let endpoint = {
        let mock_server = MockServer::builder().start().await;
        format!("{}/mcp", mock_server.uri())
    };

    let discovery = AuthDiscovery::new();
    let response = discovery.discover(&endpoint, AuthType::Oauth).await;

    // Best guess is still usable; the probe failure is surfaced as data
    assert_eq!(response.auth_type, DiscoveredAuthType::OauthStatic);
    assert!(response.error.is_some());
}

#[tokio::test]
async fn test_external_authorization_server_is_followed() {
    tests::init_tracing();
    let resource_server = MockServer::start().await;
    let auth_server = MockServer::start().await;

    mount_protected_resource(&resource_server, &auth_server.uri(), &["files:read"]).await;
    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-authorization-server"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "issuer": auth_server.uri(),
            "registration_endpoint": format!("{}/register", auth_server.uri()),
        })))
        .mount(&auth_server)
        .await;

    let discovery = AuthDiscovery::new();
    let endpoint = format!("{}/mcp", resource_server.uri());
    let response = discovery.discover(&endpoint, AuthType::Oauth).await;

    assert_eq!(response.auth_type, DiscoveredAuthType::OauthDcr);
    assert_eq!(response.scopes, vec!["files:read"]);
}
