//! # Claude Owl Connect
//!
//! Network-facing side of remote MCP server verification:
//!
//! - `probe` - bounded DNS/TLS/HTTP/MCP reachability checks
//! - `auth` - auth-metadata discovery, credential types, and the
//!   negotiation state machine

pub mod auth;
pub mod probe;

pub use auth::{
    effective_auth_type, is_valid_env_var_name, ApiKeyCredentials, AuthDiscovery, CredentialError,
    EffectiveAuthType, NegotiationAction, NegotiationFlow, NegotiationHost, NegotiationOutcome,
    NegotiationState,
};
pub use probe::ConnectionProber;
