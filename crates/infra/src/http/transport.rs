//! Transport seam between the ApiClient and the network
//!
//! [`HttpTransport`] executes exactly one request and reports what came back.
//! A non-2xx status is a normal [`RawResponse`]; only failures to obtain a
//! response at all (DNS, connect, TLS, timeout) are [`TransportError`]s.

use std::time::Duration;

use agentcore_domain::{Verb, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub const AUTHORIZATION: &str = "authorization";
pub const CONTENT_TYPE: &str = "content-type";

/// A fully resolved request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Verb,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub json_body: Option<Value>,
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn new(method: Verb, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            json_body: None,
            verify_tls: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach `Authorization: Bearer <token>`
    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.header(AUTHORIZATION, format!("Bearer {token}"))
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.json_body = Some(body);
        self
    }

    #[must_use]
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Whatever the server sent back, any status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    /// Response with a JSON body
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string()).with_header(CONTENT_TYPE, "application/json")
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossy
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// No response was obtained
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Executes one HTTP request
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_bearer_header() {
        let request = HttpRequest::new(Verb::Get, "https://x/api/").bearer("A1");
        assert_eq!(request.header_value("Authorization"), Some("Bearer A1"));
        assert_eq!(request.timeout, DEFAULT_TIMEOUT);
        assert!(request.verify_tls);
    }

    #[test]
    fn test_raw_response_helpers() {
        let response = RawResponse::json(201, &json!({"id": 1}));
        assert!(response.is_success());
        assert_eq!(response.text(), r#"{"id":1}"#);
        assert!(!RawResponse::new(401, "").is_success());
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Connect("dns error: DNS lookup failed".into());
        assert!(err.to_string().contains("DNS"));
        assert!(TransportError::Timeout(Duration::from_secs(1)).is_timeout());
    }
}
