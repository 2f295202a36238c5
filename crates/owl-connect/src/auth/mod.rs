//! Authentication: metadata discovery, credential handling, and the
//! negotiation state machine.

mod credentials;
mod discovery;
mod negotiation;

pub use credentials::{is_valid_env_var_name, ApiKeyCredentials, CredentialError};
pub use discovery::AuthDiscovery;
pub use negotiation::{
    effective_auth_type, EffectiveAuthType, NegotiationAction, NegotiationFlow, NegotiationHost,
    NegotiationOutcome, NegotiationState,
};
