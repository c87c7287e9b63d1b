//! Error types used throughout the application
//!
//! Three kinds of failure reach a caller:
//! - [`ConfigurationError`]: the local setup is incomplete or unreadable
//! - [`ApiError`]: the backend (or the network in front of it) said no
//! - [`AgentCoreError::Unexpected`]: anything else

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::impl_wire_name_conversions;
use crate::types::Verb;

/// Local configuration problems. Never retried; the user has to act.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no server configured")]
    MissingBaseUrl,

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("config file {path} is malformed: {reason}")]
    Malformed { path: String, reason: String },

    #[error("config file {path} could not be accessed: {reason}")]
    Io { path: String, reason: String },

    #[error("not logged in")]
    NotLoggedIn,

    #[error("no email given and none remembered from a previous login")]
    MissingLoginEmail,

    #[error("endpoint '{endpoint}' requires path parameter '{param}'")]
    MissingPathParam { endpoint: String, param: String },

    #[error("cannot determine the config directory: {0}")]
    NoConfigDir(String),
}

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// 401/403 on a call that could not be refreshed
    Auth,
    /// Refresh failed or the refreshed token was rejected; session is gone
    Unauthenticated,
    /// 429
    RateLimit,
    /// Other 4xx
    Client,
    /// 5xx
    Server,
    /// Connection, DNS or TLS failure
    Network,
    /// No response within the request timeout
    Timeout,
    /// 2xx with a body that is not JSON, or JSON of the wrong shape
    InvalidResponse,
}

impl_wire_name_conversions!(ApiErrorKind {
    Auth => "auth",
    Unauthenticated => "unauthenticated",
    RateLimit => "rate_limit",
    Client => "client",
    Server => "server",
    Network => "network",
    Timeout => "timeout",
    InvalidResponse => "invalid_response",
});

impl ApiErrorKind {
    /// Classify a non-2xx status code
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth,
            429 => Self::RateLimit,
            500..=599 => Self::Server,
            _ => Self::Client,
        }
    }
}

/// A structured failure observed at the ApiClient boundary
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    pub status_code: Option<u16>,
    pub body: Option<Value>,
    pub endpoint: String,
    pub verb: Verb,
}

impl ApiError {
    /// Error for a non-2xx response
    pub fn from_status(
        verb: Verb,
        endpoint: impl Into<String>,
        status: u16,
        message: impl Into<String>,
        body: Option<Value>,
    ) -> Self {
        Self {
            kind: ApiErrorKind::from_status(status),
            message: message.into(),
            status_code: Some(status),
            body,
            endpoint: endpoint.into(),
            verb,
        }
    }

    /// Error for a request that never produced a response
    pub fn network(verb: Verb, endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: message.into(),
            status_code: None,
            body: None,
            endpoint: endpoint.into(),
            verb,
        }
    }

    /// Error for a request that hit its deadline
    pub fn timeout(verb: Verb, endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: ApiErrorKind::Timeout, ..Self::network(verb, endpoint, message) }
    }

    /// Error for a 2xx response whose body could not be used
    pub fn invalid_response(
        verb: Verb,
        endpoint: impl Into<String>,
        status: u16,
        message: impl Into<String>,
        body: Option<Value>,
    ) -> Self {
        Self {
            kind: ApiErrorKind::InvalidResponse,
            message: message.into(),
            status_code: Some(status),
            body,
            endpoint: endpoint.into(),
            verb,
        }
    }

    /// Error for a call whose session could not be (re)established
    pub fn unauthenticated(
        verb: Verb,
        endpoint: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        Self {
            kind: ApiErrorKind::Unauthenticated,
            message: format!("unauthenticated: {reason}"),
            status_code: Some(401),
            body: None,
            endpoint: endpoint.into(),
            verb,
        }
    }

    /// Whether the failure left the user without a session
    pub fn is_unauthenticated(&self) -> bool {
        self.kind == ApiErrorKind::Unauthenticated
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(status) => {
                write!(f, "{} {} failed ({}): {}", self.verb, self.endpoint, status, self.message)
            }
            None => write!(f, "{} {} failed: {}", self.verb, self.endpoint, self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Main error type for AgentCore operations
#[derive(Error, Debug, Clone)]
pub enum AgentCoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigurationError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Unexpected error: {type_name}: {message}")]
    Unexpected { type_name: String, message: String },
}

impl AgentCoreError {
    /// Wrap an arbitrary error, remembering its type for display
    pub fn unexpected<E: std::error::Error>(err: E) -> Self {
        Self::Unexpected { type_name: short_type_name::<E>(), message: err.to_string() }
    }
}

impl From<serde_json::Error> for AgentCoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::unexpected(err)
    }
}

/// Last path segment of a type name, generics stripped
fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Result type alias for AgentCore operations
pub type Result<T> = std::result::Result<T, AgentCoreError>;
