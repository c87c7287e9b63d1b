//! # AgentCore Domain
//!
//! Types shared by every layer of the AgentCore CLI.
//!
//! This crate contains:
//! - Error types and the crate-wide `Result`
//! - The endpoint registry
//! - Request, session and resource records
//!
//! ## Architecture
//! - No dependencies on other AgentCore crates
//! - No I/O; disk and network access live in `agentcore-infra`

pub mod endpoints;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use endpoints::Endpoint;
pub use errors::*;
pub use types::*;
