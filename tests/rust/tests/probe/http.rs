//! Reachability probe behavior against a local mock endpoint. The mock is
//! plain HTTP, so the TLS step always records a warning here.

use std::time::Duration;

use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use owl_connect::ConnectionProber;
use owl_core::domain::{ConnectionErrorCode, StepStatus, Transport};

const BUDGET: Duration = Duration::from_secs(10);

async fn mock_mcp_server() -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mcp"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#, "application/json"),
        )
        .mount(&mock_server)
        .await;
    mock_server
}

#[tokio::test]
async fn test_probe_succeeds_and_detects_json_rpc() {
    tests::init_tracing();
    let mock_server = mock_mcp_server().await;
    let endpoint = format!("{}/mcp", mock_server.uri());

    let prober = ConnectionProber::new();
    let result = prober.test(&endpoint, Transport::Http, BUDGET).await;

    assert!(result.success, "expected success, got {:?}", result.error);
    assert!(result.latency_ms.is_some());
    assert_eq!(result.steps.len(), 4);

    assert_eq!(result.step("dns").unwrap().status, StepStatus::Success);
    assert_eq!(result.step("tls").unwrap().status, StepStatus::Warning);
    assert_eq!(result.step("http").unwrap().status, StepStatus::Success);
    assert_eq!(result.step("mcp").unwrap().status, StepStatus::Success);
}

#[tokio::test]
async fn test_auth_rejection_is_reachable_with_warning() {
    tests::init_tracing();
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let prober = ConnectionProber::new();
    let result = prober
        .test(&mock_server.uri(), Transport::Http, BUDGET)
        .await;

    // The endpoint answered, so the test succeeds even though it wants auth
    assert!(result.success);
    let http = result.step("http").unwrap();
    assert_eq!(http.status, StepStatus::Warning);
    assert!(http.detail.as_ref().unwrap().contains("401"));
}

#[tokio::test]
async fn test_sse_content_type_is_an_mcp_signal() {
    tests::init_tracing();
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("event: message\ndata: {}\n\n", "text/event-stream"),
        )
        .mount(&mock_server)
        .await;

    let prober = ConnectionProber::new();
    let result = prober
        .test(&mock_server.uri(), Transport::Sse, BUDGET)
        .await;

    assert!(result.success);
    assert_eq!(result.step("mcp").unwrap().status, StepStatus::Success);
}

#[tokio::test]
async fn test_session_header_is_an_mcp_signal() {
    tests::init_tracing();
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("mcp-session-id", "session-123"),
        )
        .mount(&mock_server)
        .await;

    let prober = ConnectionProber::new();
    let result = prober
        .test(&mock_server.uri(), Transport::Http, BUDGET)
        .await;

    assert!(result.success);
    assert_eq!(result.step("mcp").unwrap().status, StepStatus::Success);
}

#[tokio::test]
async fn test_plain_html_yields_mcp_warning_not_failure() {
    tests::init_tracing();
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>hello</html>"),
        )
        .mount(&mock_server)
        .await;

    let prober = ConnectionProber::new();
    let result = prober
        .test(&mock_server.uri(), Transport::Http, BUDGET)
        .await;

    // Reachable, just not recognizably MCP
    assert!(result.success);
    assert_eq!(result.step("mcp").unwrap().status, StepStatus::Warning);
}

#[tokio::test]
async fn test_refused_connection_is_a_network_error() {
    tests::init_tracing();
    // Grab a port that answered once, then stop listening on it. An exclusive
    // server is required: pooled servers keep listening after drop.
    let endpoint = {
        let mock_server = MockServer::builder().start().await;
        mock_server.uri()
    };

    let prober = ConnectionProber::new();
    let result = prober.test(&endpoint, Transport::Http, BUDGET).await;

    assert!(!result.success);
    assert_eq!(result.error_code, Some(ConnectionErrorCode::NetworkError));
    assert_eq!(result.step("http").unwrap().status, StepStatus::Error);
    assert!(!result.suggestions.is_empty());
}

#[tokio::test]
async fn test_concurrent_probes_are_independent() {
    tests::init_tracing();
    let mock_server = mock_mcp_server().await;
    let endpoint = format!("{}/mcp", mock_server.uri());

    let prober = ConnectionProber::new();
    let probes = (0..4).map(|_| prober.test(&endpoint, Transport::Http, BUDGET));
    let results = futures::future::join_all(probes).await;

    assert_eq!(results.len(), 4);
    for result in &results {
        assert!(result.success);
        assert_eq!(result.steps.len(), 4);
    }
}
