//! HTTP transport
//!
//! [`HttpTransport`] is the seam the ApiClient dispatches through;
//! [`ReqwestTransport`] is the production implementation.

pub mod client;
pub mod transport;

pub use client::{ReqwestTransport, ReqwestTransportBuilder, DEFAULT_USER_AGENT};
pub use transport::{HttpRequest, HttpTransport, RawResponse, TransportError};
