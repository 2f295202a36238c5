//! Core domain entities for the remote MCP server directory.

mod connection;
mod discovery;
mod security;
mod server;

pub use connection::*;
pub use discovery::*;
pub use security::*;
pub use server::*;
