//! # AgentCore Infrastructure
//!
//! Disk and network access for the AgentCore CLI.
//!
//! ## Modules
//! - [`config`]: the JSON config document and its directory
//! - [`http`]: the transport seam and its reqwest implementation
//! - [`api`]: the authenticated client with one-shot token refresh

pub mod api;
pub mod config;
pub mod http;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientBuilder, ApiClientConfig};
pub use config::ConfigStore;
pub use http::{HttpRequest, HttpTransport, RawResponse, ReqwestTransport, TransportError};
