//! Bounded reachability probe for one remote MCP endpoint.
//!
//! Runs DNS resolution, TLS verification, HTTP reachability, and best-effort
//! MCP protocol detection in order, each step drawing from a single overall
//! timeout budget. Expected failures are returned as data in
//! `ConnectionTestResult`; the probe itself never errors. Idempotent and safe
//! to retry; timeout is the only bounded-duration guarantee.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use owl_core::domain::{
    ConnectionErrorCode, ConnectionStep, ConnectionTestResult, ConnectionTester, StepStatus,
    Transport,
};

const STEP_DNS: &str = "DNS Resolution";
const STEP_TLS: &str = "TLS Verification";
const STEP_HTTP: &str = "HTTP Reachability";
const STEP_MCP: &str = "MCP Protocol Detection";

/// Connection prober with a strict (certificate-validating) client and a
/// lenient one used only to distinguish bad certificates from dead hosts.
pub struct ConnectionProber {
    strict: reqwest::Client,
    lenient: reqwest::Client,
}

impl ConnectionProber {
    pub fn new() -> Self {
        let user_agent = concat!("ClaudeOwl/", env!("CARGO_PKG_VERSION"));
        let strict = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .expect("Failed to build HTTP client");
        let lenient = reqwest::Client::builder()
            .user_agent(user_agent)
            .danger_accept_invalid_certs(true)
            .build()
            .expect("Failed to build HTTP client");

        Self { strict, lenient }
    }

    /// Run one connection test against `endpoint_url`, bounded by `timeout`.
    ///
    /// Invalid input fails immediately with `INVALID_URL` and no network
    /// activity; no partial steps are recorded in that case.
    pub async fn test(
        &self,
        endpoint_url: &str,
        transport: Transport,
        timeout: Duration,
    ) -> ConnectionTestResult {
        let url = match parse_endpoint(endpoint_url) {
            Ok(url) => url,
            Err(reason) => {
                return ConnectionTestResult::failed(
                    ConnectionErrorCode::InvalidUrl,
                    reason,
                    Vec::new(),
                    suggestions_for(ConnectionErrorCode::InvalidUrl),
                );
            }
        };

        let deadline = Instant::now() + timeout;
        let mut steps = Vec::new();

        // Step 1: DNS resolution
        let Some(host) = url.host_str().map(str::to_string) else {
            return ConnectionTestResult::failed(
                ConnectionErrorCode::InvalidUrl,
                "endpoint URL has no host",
                Vec::new(),
                suggestions_for(ConnectionErrorCode::InvalidUrl),
            );
        };
        let port = url.port_or_known_default().unwrap_or(443);

        match bounded(deadline, tokio::net::lookup_host((host.as_str(), port))).await {
            Err(TimedOut) => return timeout_result(steps, STEP_DNS),
            Ok(Err(e)) => {
                steps.push(ConnectionStep::error(STEP_DNS, e.to_string()));
                let code = classify_resolver_error(&e);
                return ConnectionTestResult::failed(
                    code,
                    format!("failed to resolve {}: {}", host, e),
                    steps,
                    suggestions_for(code),
                );
            }
            Ok(Ok(mut addrs)) => match addrs.next() {
                Some(addr) => {
                    debug!("{} resolved to {}", host, addr);
                    steps.push(ConnectionStep::success(
                        STEP_DNS,
                        format!("{} resolved to {}", host, addr),
                    ));
                }
                None => {
                    steps.push(ConnectionStep::error(STEP_DNS, "no addresses returned"));
                    return ConnectionTestResult::failed(
                        ConnectionErrorCode::DnsError,
                        format!("no addresses returned for {}", host),
                        steps,
                        suggestions_for(ConnectionErrorCode::DnsError),
                    );
                }
            },
        }

        // Step 2: TLS verification (https only). Certificate problems are a
        // warning, not a hard failure; they feed the security context.
        let mut client = &self.strict;
        if url.scheme() == "https" {
            match bounded(deadline, self.strict.head(url.clone()).send()).await {
                Err(TimedOut) => return timeout_result(steps, STEP_TLS),
                Ok(Ok(_)) => {
                    steps.push(ConnectionStep::success(STEP_TLS, "certificate chain verified"));
                }
                Ok(Err(e)) if e.is_connect() => {
                    // Retry without verification to tell a bad certificate
                    // apart from an unreachable host.
                    match bounded(deadline, self.lenient.head(url.clone()).send()).await {
                        Err(TimedOut) => return timeout_result(steps, STEP_TLS),
                        Ok(Ok(_)) => {
                            steps.push(ConnectionStep::warning(
                                STEP_TLS,
                                "certificate could not be verified (self-signed or expired)",
                            ));
                            client = &self.lenient;
                        }
                        Ok(Err(_)) => {
                            steps.push(ConnectionStep::warning(
                                STEP_TLS,
                                "TLS handshake could not be completed",
                            ));
                        }
                    }
                }
                Ok(Err(e)) => {
                    steps.push(ConnectionStep::warning(
                        STEP_TLS,
                        format!("TLS check inconclusive: {}", e),
                    ));
                }
            }
        } else {
            steps.push(ConnectionStep::warning(STEP_TLS, "endpoint does not use HTTPS"));
        }

        // Step 3: HTTP reachability. Many MCP servers reject unauthenticated
        // probes, so a non-2xx/3xx status is a warning rather than a failure.
        let accept = match transport {
            Transport::Sse => "text/event-stream",
            Transport::Http => "application/json, text/event-stream",
        };
        let started = Instant::now();
        let response = match bounded(
            deadline,
            client.get(url.clone()).header("Accept", accept).send(),
        )
        .await
        {
            Err(TimedOut) => return timeout_result(steps, STEP_HTTP),
            Ok(Err(e)) => {
                steps.push(ConnectionStep::error(STEP_HTTP, e.to_string()));
                return ConnectionTestResult::failed(
                    ConnectionErrorCode::NetworkError,
                    format!("request failed: {}", e),
                    steps,
                    suggestions_for(ConnectionErrorCode::NetworkError),
                );
            }
            Ok(Ok(response)) => response,
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            steps.push(ConnectionStep::success(
                STEP_HTTP,
                format!("HTTP {} in {}ms", status.as_u16(), latency_ms),
            ));
        } else {
            steps.push(ConnectionStep::warning(
                STEP_HTTP,
                format!(
                    "HTTP {} (server may require authentication)",
                    status.as_u16()
                ),
            ));
        }

        // Step 4: best-effort MCP protocol detection
        match self.detect_mcp(deadline, response).await {
            Err(TimedOut) => return timeout_result(steps, STEP_MCP),
            Ok(step) => steps.push(step),
        }

        ConnectionTestResult::succeeded(latency_ms, steps)
    }

    /// Inspect response headers and (for JSON responses) the body shape for
    /// an MCP signal. Absence of a signal is a warning, never an error.
    async fn detect_mcp(
        &self,
        deadline: Instant,
        response: reqwest::Response,
    ) -> Result<ConnectionStep, TimedOut> {
        if response.headers().contains_key("mcp-session-id") {
            return Ok(ConnectionStep::success(
                STEP_MCP,
                "server returned an MCP session header",
            ));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.starts_with("text/event-stream") {
            return Ok(ConnectionStep::success(
                STEP_MCP,
                "server answers with an SSE stream",
            ));
        }

        if content_type.starts_with("application/json") {
            let body = bounded(deadline, response.text()).await?;
            if let Ok(text) = body {
                if text.contains("jsonrpc") {
                    return Ok(ConnectionStep::success(
                        STEP_MCP,
                        "server speaks JSON-RPC",
                    ));
                }
            }
        }

        Ok(ConnectionStep::warning(
            STEP_MCP,
            "no MCP protocol signal detected",
        ))
    }
}

impl Default for ConnectionProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionTester for ConnectionProber {
    async fn test(
        &self,
        endpoint_url: &str,
        transport: Transport,
        timeout: Duration,
    ) -> ConnectionTestResult {
        ConnectionProber::test(self, endpoint_url, transport, timeout).await
    }
}

struct TimedOut;

/// Await `future` within whatever remains of the overall budget.
async fn bounded<F, T>(deadline: Instant, future: F) -> Result<T, TimedOut>
where
    F: std::future::Future<Output = T>,
{
    let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
        return Err(TimedOut);
    };
    tokio::time::timeout(remaining, future)
        .await
        .map_err(|_| TimedOut)
}

fn parse_endpoint(endpoint_url: &str) -> Result<Url, String> {
    match Url::parse(endpoint_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => Ok(url),
        Ok(url) => Err(format!(
            "endpoint must be an absolute http(s) URL, got scheme '{}'",
            url.scheme()
        )),
        Err(e) => Err(format!("invalid endpoint URL: {}", e)),
    }
}

fn classify_resolver_error(e: &std::io::Error) -> ConnectionErrorCode {
    // lookup_host surfaces malformed input as InvalidInput; everything else
    // coming out of the resolver is a DNS failure.
    if e.kind() == std::io::ErrorKind::InvalidInput {
        ConnectionErrorCode::NetworkError
    } else {
        ConnectionErrorCode::DnsError
    }
}

fn timeout_result(mut steps: Vec<ConnectionStep>, current_step: &str) -> ConnectionTestResult {
    steps.push(ConnectionStep::error(current_step, "timed out"));
    ConnectionTestResult::failed(
        ConnectionErrorCode::Timeout,
        "connection test exceeded its timeout budget",
        steps,
        suggestions_for(ConnectionErrorCode::Timeout),
    )
}

fn suggestions_for(code: ConnectionErrorCode) -> Vec<String> {
    let hints: &[&str] = match code {
        ConnectionErrorCode::InvalidUrl => {
            &["Check the endpoint URL format (must start with http:// or https://)"]
        }
        ConnectionErrorCode::DnsError => &[
            "Verify the hostname is spelled correctly",
            "Check your network connection",
        ],
        ConnectionErrorCode::Timeout => {
            &["The server may be slow or unreachable; retry with a longer timeout"]
        }
        ConnectionErrorCode::NetworkError => &[
            "Check that the server is running and reachable",
            "Verify any VPN or proxy settings",
        ],
    };
    hints.iter().map(|s| s.to_string()).collect()
}
