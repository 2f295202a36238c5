//! User-supplied credential material.
//!
//! The secret lives in zeroizing memory, is never logged or echoed back, and
//! is dropped immediately after handoff to the host persistence boundary.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use zeroize::Zeroizing;

lazy_static! {
    static ref ENV_VAR_NAME: Regex = Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap();
}

/// Check that a name is a safe environment variable identifier.
pub fn is_valid_env_var_name(name: &str) -> bool {
    ENV_VAR_NAME.is_match(name)
}

/// Credential form validation failures, surfaced at the form step.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("API key must not be empty")]
    EmptyKey,

    #[error("environment variable name must be uppercase letters, digits, and underscores, starting with a letter")]
    InvalidEnvVarName,
}

/// An API key (or header token) plus the environment variable it should be
/// exposed under.
pub struct ApiKeyCredentials {
    env_var_name: String,
    api_key: Zeroizing<String>,
}

impl ApiKeyCredentials {
    pub fn new(env_var_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            env_var_name: env_var_name.into(),
            api_key: Zeroizing::new(api_key.into()),
        }
    }

    pub fn env_var_name(&self) -> &str {
        &self.env_var_name
    }

    /// The secret value. Callers must not log or persist this outside the
    /// host boundary.
    pub fn secret(&self) -> &str {
        &self.api_key
    }

    /// Validate the form input before submission.
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.api_key.trim().is_empty() {
            return Err(CredentialError::EmptyKey);
        }
        if !is_valid_env_var_name(&self.env_var_name) {
            return Err(CredentialError::InvalidEnvVarName);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ApiKeyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyCredentials")
            .field("env_var_name", &self.env_var_name)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
