use std::error::Error as _;
use std::time::Duration;

use agentcore_domain::{Verb, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;

use super::transport::{HttpRequest, HttpTransport, RawResponse, TransportError};

/// `User-Agent` sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("agentcore/", env!("CARGO_PKG_VERSION"));

/// [`HttpTransport`] backed by reqwest.
///
/// Holds two clients so a request can opt out of certificate verification
/// without rebuilding anything. No retries happen at this layer.
#[derive(Clone)]
pub struct ReqwestTransport {
    verifying: ReqwestClient,
    insecure: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }

    fn client_for(&self, verify_tls: bool) -> &ReqwestClient {
        if verify_tls {
            &self.verifying
        } else {
            &self.insecure
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let HttpRequest { method, url, headers, json_body, verify_tls, timeout } = request;

        let mut builder =
            self.client_for(verify_tls).request(to_method(method), &url).timeout(timeout);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = json_body {
            builder = builder.json(&body);
        }

        debug!(%method, %url, verify_tls, "sending HTTP request");

        let response = builder.send().await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            classify(&err, timeout)
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(|err| classify(&err, timeout))?.to_vec();

        debug!(%method, %url, status, bytes = body.len(), "received HTTP response");
        Ok(RawResponse { status, headers, body })
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self { timeout: DEFAULT_TIMEOUT, user_agent: None }
    }
}

impl ReqwestTransportBuilder {
    /// Client-wide ceiling; each request also carries its own timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, TransportError> {
        let verifying = self.client(false)?;
        let insecure = self.client(true)?;
        Ok(ReqwestTransport { verifying, insecure })
    }

    fn client(&self, accept_invalid_certs: bool) -> Result<ReqwestClient, TransportError> {
        let agent = self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let mut builder = ReqwestClient::builder().timeout(self.timeout).user_agent(agent);

        if accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build().map_err(|err| TransportError::Request(error_chain(&err)))
    }
}

fn to_method(verb: Verb) -> Method {
    match verb {
        Verb::Get => Method::GET,
        Verb::Post => Method::POST,
        Verb::Put => Method::PUT,
        Verb::Patch => Method::PATCH,
        Verb::Delete => Method::DELETE,
    }
}

fn classify(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(timeout);
    }
    if err.is_connect() {
        return TransportError::Connect(error_chain(err));
    }
    TransportError::Request(error_chain(err))
}

/// Flatten an error and its sources into one line; reqwest keeps the useful
/// part (DNS, TLS, refused) in the source chain.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
