//! # Claude Owl Bridge
//!
//! The application-boundary contract: request/response-shaped operations the
//! host application (UI shell) calls into, plus the collaborator traits the
//! core calls back out through. No files are written here directly; server
//! persistence and secret storage belong to the host's `ConfigStore`.

mod boundary;
mod host;

pub use boundary::{
    ActionResponse, DetailsResponse, DirectoryResponse, OwlBridge, SearchResponse,
    ServerTestOutcome, TestAllResponse, TestConnectionResponse, TestProgress,
};
pub use host::{AuthSurface, ConfigScope, ConfigStore};
