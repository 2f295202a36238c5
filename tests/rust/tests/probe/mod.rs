//! Connection probe integration tests against a local mock HTTP server.

mod http;
