//! Authenticated access to the backend
//!
//! - [`ApiClient`] builds requests, attaches the bearer token and interprets
//!   responses
//! - [`TokenRefresher`] exchanges the refresh token after a 401
//! - [`response`] maps raw responses and transport failures to `ApiError`

pub mod auth;
pub mod client;
pub mod response;

pub use auth::{RefreshFailure, TokenRefresher};
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig};
