//! Auth negotiation state machine.
//!
//! An explicit FSM with pure transition logic: the flow exposes its current
//! state and allowed actions so it can be unit-tested without a UI harness.
//! Host side effects (persisting the server, storing a key, launching the
//! external OAuth surface) go through the injected `NegotiationHost`.
//!
//! One flow instance per server at a time; cancelling discards the instance
//! and all in-memory credential state with it.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use owl_core::domain::{AuthType, DiscoverAuthResponse, DiscoveredAuthType, ServerDescriptor};

use super::credentials::ApiKeyCredentials;

/// Credential-collection path chosen after discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveAuthType {
    /// Two-step flow: add server, then hand off to the external OAuth surface
    OauthDcr,
    /// Validated form collecting a key and env-var name
    ApiKey,
    /// Direct add, no credential collection
    Open,
}

/// Pick the effective path from the declared type and the discovery result.
///
/// A discovered `oauth-static` is auto-remapped to the API-key form, since
/// the host cannot complete DCR-less OAuth; otherwise the declared type wins.
pub fn effective_auth_type(
    declared: AuthType,
    discovery: Option<&DiscoverAuthResponse>,
) -> EffectiveAuthType {
    if let Some(discovered) = discovery {
        if discovered.auth_type == DiscoveredAuthType::OauthStatic {
            return EffectiveAuthType::ApiKey;
        }
    }
    match declared {
        AuthType::Oauth => EffectiveAuthType::OauthDcr,
        AuthType::ApiKey | AuthType::Header => EffectiveAuthType::ApiKey,
        AuthType::Open => EffectiveAuthType::Open,
    }
}

/// Flow states. Errors are carried in the state so the user can retry the
/// step where they acted without restarting the whole flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationState {
    /// Showing server info; discovery runs here
    Overview,
    /// Effective path known, before any credential step
    Configure { error: Option<String> },
    /// OAuth step 2: server added, external authentication pending
    OauthAuthenticate { error: Option<String> },
    /// Collecting an API key and env-var name
    ApiKeyForm { error: Option<String> },
    /// Terminal: flow succeeded
    Complete,
    /// Terminal: user cancelled; all credential state discarded
    Cancelled,
}

/// Actions the UI may offer in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationAction {
    Proceed,
    SubmitCredentials,
    Authenticate,
    Cancel,
}

/// Host application boundary the flow calls back into.
#[async_trait]
pub trait NegotiationHost: Send + Sync {
    /// Register the server descriptor with the host configuration.
    async fn add_server(
        &self,
        server: &ServerDescriptor,
        custom_name: Option<&str>,
    ) -> anyhow::Result<()>;

    /// Persist an API key for the server. The host owns secret storage.
    async fn configure_api_key(
        &self,
        server: &ServerDescriptor,
        credentials: &ApiKeyCredentials,
    ) -> anyhow::Result<()>;

    /// Hand off to the external OAuth authentication surface.
    async fn launch_oauth(&self, server: &ServerDescriptor) -> anyhow::Result<()>;
}

/// Final outcome reported when the flow reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationOutcome {
    pub success: bool,
    pub message: String,
}

/// One negotiation flow for one server.
pub struct NegotiationFlow {
    server: ServerDescriptor,
    host: Arc<dyn NegotiationHost>,
    custom_name: Option<String>,
    state: NegotiationState,
    effective: Option<EffectiveAuthType>,
    discovery: Option<DiscoverAuthResponse>,
}

impl NegotiationFlow {
    pub fn new(server: ServerDescriptor, host: Arc<dyn NegotiationHost>) -> Self {
        Self {
            server,
            host,
            custom_name: None,
            state: NegotiationState::Overview,
            effective: None,
            discovery: None,
        }
    }

    /// Register the server under a user-chosen name.
    pub fn with_custom_name(mut self, name: impl Into<String>) -> Self {
        self.custom_name = Some(name.into());
        self
    }

    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    pub fn server(&self) -> &ServerDescriptor {
        &self.server
    }

    /// Effective path, known once discovery has completed.
    pub fn effective_auth(&self) -> Option<EffectiveAuthType> {
        self.effective
    }

    pub fn discovery(&self) -> Option<&DiscoverAuthResponse> {
        self.discovery.as_ref()
    }

    /// Record the discovery result and move to `Configure`.
    pub fn begin(&mut self, discovery: DiscoverAuthResponse) -> anyhow::Result<()> {
        if self.state != NegotiationState::Overview {
            anyhow::bail!("begin is only valid from the overview state");
        }
        self.effective = Some(effective_auth_type(
            self.server.auth_type(),
            Some(&discovery),
        ));
        self.discovery = Some(discovery);
        self.state = NegotiationState::Configure { error: None };
        Ok(())
    }

    /// Actions available in the current state.
    pub fn allowed_actions(&self) -> Vec<NegotiationAction> {
        match &self.state {
            NegotiationState::Overview => vec![NegotiationAction::Cancel],
            NegotiationState::Configure { .. } => {
                vec![NegotiationAction::Proceed, NegotiationAction::Cancel]
            }
            NegotiationState::OauthAuthenticate { .. } => {
                vec![NegotiationAction::Authenticate, NegotiationAction::Cancel]
            }
            NegotiationState::ApiKeyForm { .. } => {
                vec![
                    NegotiationAction::SubmitCredentials,
                    NegotiationAction::Cancel,
                ]
            }
            NegotiationState::Complete | NegotiationState::Cancelled => vec![],
        }
    }

    /// Advance from `Configure` along the effective path.
    ///
    /// For `open`, adds the server directly and completes. For OAuth, runs
    /// step 1 (add server); step 2 only becomes reachable once step 1
    /// succeeds. For API key, moves to the form without side effects.
    pub async fn proceed(&mut self) -> anyhow::Result<()> {
        if !matches!(self.state, NegotiationState::Configure { .. }) {
            anyhow::bail!("proceed is only valid from the configure state");
        }
        let effective = self
            .effective
            .ok_or_else(|| anyhow::anyhow!("proceed called before discovery"))?;

        match effective {
            EffectiveAuthType::Open => match self.add_server().await {
                Ok(()) => {
                    info!("Added open server {}", self.server.id);
                    self.state = NegotiationState::Complete;
                }
                Err(e) => {
                    self.state = NegotiationState::Configure {
                        error: Some(format!("Failed to add server: {}", e)),
                    };
                }
            },
            EffectiveAuthType::OauthDcr => match self.add_server().await {
                Ok(()) => {
                    self.state = NegotiationState::OauthAuthenticate { error: None };
                }
                Err(e) => {
                    self.state = NegotiationState::Configure {
                        error: Some(format!("Failed to add server: {}", e)),
                    };
                }
            },
            EffectiveAuthType::ApiKey => {
                self.state = NegotiationState::ApiKeyForm { error: None };
            }
        }
        Ok(())
    }

    /// OAuth step 2: hand off to the external authentication surface.
    /// Independently retryable on failure.
    pub async fn authenticate(&mut self) -> anyhow::Result<()> {
        if !matches!(self.state, NegotiationState::OauthAuthenticate { .. }) {
            anyhow::bail!("authenticate is only valid after the server was added");
        }

        match self.host.launch_oauth(&self.server).await {
            Ok(()) => {
                info!("OAuth handoff complete for {}", self.server.id);
                self.state = NegotiationState::Complete;
            }
            Err(e) => {
                self.state = NegotiationState::OauthAuthenticate {
                    error: Some(format!("Authentication failed: {}", e)),
                };
            }
        }
        Ok(())
    }

    /// Submit the API-key form. Validation failures keep the flow in the
    /// form with an error; the credentials are dropped (and zeroized) when
    /// this method returns.
    pub async fn submit_api_key(&mut self, credentials: ApiKeyCredentials) -> anyhow::Result<()> {
        if !matches!(self.state, NegotiationState::ApiKeyForm { .. }) {
            anyhow::bail!("submit_api_key is only valid from the form state");
        }

        if let Err(e) = credentials.validate() {
            self.state = NegotiationState::ApiKeyForm {
                error: Some(e.to_string()),
            };
            return Ok(());
        }

        match self
            .host
            .configure_api_key(&self.server, &credentials)
            .await
        {
            Ok(()) => {
                info!("API key configured for {}", self.server.id);
                self.state = NegotiationState::Complete;
            }
            Err(e) => {
                self.state = NegotiationState::ApiKeyForm {
                    error: Some(format!("Failed to store credentials: {}", e)),
                };
            }
        }
        Ok(())
    }

    /// Cancel from any non-terminal state. No secret survives a cancel: the
    /// flow never retains credential material between calls.
    pub fn cancel(&mut self) {
        if self.state != NegotiationState::Complete {
            self.state = NegotiationState::Cancelled;
        }
    }

    /// Outcome, once a terminal state is reached.
    pub fn outcome(&self) -> Option<NegotiationOutcome> {
        match &self.state {
            NegotiationState::Complete => Some(NegotiationOutcome {
                success: true,
                message: format!("Connected to {}", self.server.name),
            }),
            NegotiationState::Cancelled => Some(NegotiationOutcome {
                success: false,
                message: "Setup cancelled".to_string(),
            }),
            _ => None,
        }
    }

    async fn add_server(&self) -> anyhow::Result<()> {
        self.host
            .add_server(&self.server, self.custom_name.as_deref())
            .await
    }
}
