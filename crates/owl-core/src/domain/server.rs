//! Remote MCP server descriptors as shipped in the curated and live directories.

use serde::{Deserialize, Serialize};

/// Wire mechanism a remote MCP server speaks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Streamable HTTP (request/response)
    #[default]
    Http,
    /// Server-sent events stream
    Sse,
}

/// Declared authentication type discriminant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AuthType {
    /// OAuth 2.0/2.1 (server implements the protocol)
    Oauth,
    /// API key or personal access token
    ApiKey,
    /// Custom HTTP header carrying a token
    Header,
    /// No authentication required
    Open,
}

/// Authentication configuration, one variant per declared auth type.
///
/// Each variant carries only the fields relevant to its flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthSpec {
    /// OAuth with optional provider branding and requested scopes
    Oauth {
        /// OAuth provider name shown to the user (e.g. "GitHub")
        provider: Option<String>,
        /// Scopes the server requests during authorization
        #[serde(default)]
        scopes: Vec<String>,
    },
    /// API key supplied by the user
    ApiKey {
        /// Suggested environment variable name (e.g. "GITHUB_TOKEN")
        env_var: String,
        /// Where the user can obtain a key
        #[serde(skip_serializing_if = "Option::is_none")]
        obtain_url: Option<String>,
        /// Step-by-step acquisition instructions
        #[serde(skip_serializing_if = "Option::is_none")]
        instructions: Option<String>,
    },
    /// Token passed in a custom HTTP header
    Header {
        /// Header name (e.g. "X-Api-Key")
        header_name: String,
        /// Suggested environment variable name for the token value
        env_var: String,
    },
    /// No credentials needed
    Open,
}

impl AuthSpec {
    /// Discriminant of this auth configuration.
    pub fn auth_type(&self) -> AuthType {
        match self {
            Self::Oauth { .. } => AuthType::Oauth,
            Self::ApiKey { .. } => AuthType::ApiKey,
            Self::Header { .. } => AuthType::Header,
            Self::Open => AuthType::Open,
        }
    }

    /// Scopes requested by this configuration (empty for non-OAuth).
    pub fn scopes(&self) -> &[String] {
        match self {
            Self::Oauth { scopes, .. } => scopes,
            _ => &[],
        }
    }
}

/// Provider/vendor information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderInfo {
    /// Provider name (e.g. "GitHub", "Cloudflare")
    pub name: String,

    /// Provider primary domain (e.g. "github.com")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Whether this is an official integration by the service provider
    #[serde(default)]
    pub official: bool,
}

/// Category for organizing servers in the directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ServerCategory {
    /// Developer tools (GitHub, Sentry, etc.)
    DeveloperTools,
    /// Cloud platforms
    Cloud,
    /// Databases and data storage
    Database,
    /// Communication (Slack, email)
    Communication,
    /// Productivity (Notion, docs)
    Productivity,
    /// Search and web browsing
    Search,
    /// Finance and payments
    Finance,
    /// Analytics and monitoring
    Analytics,
    /// Other/uncategorized
    Other,
    /// Custom category from a live directory
    #[serde(untagged)]
    Custom(String),
}

impl ServerCategory {
    /// Stable string form, matching the serialized representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::DeveloperTools => "developer-tools",
            Self::Cloud => "cloud",
            Self::Database => "database",
            Self::Communication => "communication",
            Self::Productivity => "productivity",
            Self::Search => "search",
            Self::Finance => "finance",
            Self::Analytics => "analytics",
            Self::Other => "other",
            Self::Custom(name) => name,
        }
    }
}

/// Static metadata for one remote MCP server.
///
/// Built by the registry service when assembling the directory and immutable
/// once returned to callers; superseded wholesale on refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerDescriptor {
    /// Unique identifier, stable across sessions (e.g. "github-mcp")
    pub id: String,

    /// Display name
    pub name: String,

    /// Short description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Provider info
    pub provider: ProviderInfo,

    /// Endpoint URL
    pub endpoint: String,

    /// Transport mechanism
    pub transport: Transport,

    /// Declared authentication configuration
    pub auth: AuthSpec,

    /// Whether the entry comes from a curated/trusted source
    #[serde(default)]
    pub verified: bool,

    /// Directory category
    pub category: ServerCategory,

    /// Free-form tags used by search
    #[serde(default)]
    pub tags: Vec<String>,

    /// Logo URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    /// Documentation URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
}

impl ServerDescriptor {
    /// Declared auth type discriminant.
    pub fn auth_type(&self) -> AuthType {
        self.auth.auth_type()
    }
}
