//! Authenticated API client
//!
//! Every call rereads the access token from the [`ConfigStore`], dispatches
//! through an [`HttpTransport`] and interprets the response. A 401 on an
//! authenticated call triggers at most one token refresh followed by exactly
//! one retry of the original request.

use std::sync::Arc;
use std::time::Duration;

use agentcore_domain::endpoints::TOKEN_REFRESH;
use agentcore_domain::{
    ApiError, ApiRequest, ConfigurationError, Query, Result, ServerBinding, Verb, DEFAULT_TIMEOUT,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::auth::TokenRefresher;
use super::response;
use crate::config::ConfigStore;
use crate::http::{HttpRequest, HttpTransport, RawResponse};

/// Configuration for API client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClientConfig {
    /// Timeout applied to requests built by the client
    pub timeout: Duration,
    /// Path the refresh token is exchanged at
    pub refresh_endpoint: String,
    /// Verify server certificates
    pub verify_tls: bool,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            refresh_endpoint: TOKEN_REFRESH.path().to_string(),
            verify_tls: true,
        }
    }
}

/// API client bound to one server
pub struct ApiClient {
    store: ConfigStore,
    server: ServerBinding,
    transport: Arc<dyn HttpTransport>,
    refresher: TokenRefresher,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// The server binding is read once here and never again.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingBaseUrl` when no server is
    /// configured, or any error reading the config document.
    pub fn new(
        store: ConfigStore,
        transport: Arc<dyn HttpTransport>,
        config: ApiClientConfig,
    ) -> std::result::Result<Self, ConfigurationError> {
        let server = store.require_server_binding()?;
        let refresher = TokenRefresher::new(
            store.clone(),
            transport.clone(),
            &server,
            &config.refresh_endpoint,
        );

        Ok(Self { store, server, transport, refresher, config })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn server(&self) -> &ServerBinding {
        &self.server
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Request carrying this client's timeout and TLS setting
    pub fn request(&self, verb: Verb, endpoint_path: impl Into<String>) -> ApiRequest {
        ApiRequest::new(verb, endpoint_path)
            .timeout(self.config.timeout)
            .verify_tls(self.config.verify_tls)
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// Returns `AgentCoreError::Api` for any transport, status or decoding
    /// failure and `AgentCoreError::Config` if the config document is
    /// unreadable.
    pub async fn get(&self, path: &str, query: Query) -> Result<Value> {
        self.send(self.request(Verb::Get, path).query(query)).await
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.send(self.request(Verb::Post, path).json(body)).await
    }

    /// Execute a PUT request with a JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.send(self.request(Verb::Put, path).json(body)).await
    }

    /// Execute a PATCH request with a JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.send(self.request(Verb::Patch, path).json(body)).await
    }

    /// Execute a DELETE request
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.send(self.request(Verb::Delete, path)).await
    }

    /// Send a prepared request and return the decoded body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    #[instrument(skip(self, request), fields(verb = %request.verb, path = %request.endpoint_path))]
    pub async fn send(&self, request: ApiRequest) -> Result<Value> {
        let (_, body) = self.dispatch(&request).await?;
        Ok(body)
    }

    /// Send a prepared request and decode the body into `T`
    ///
    /// A 2xx body of the wrong shape is an `InvalidResponse` error.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    #[instrument(skip(self, request), fields(verb = %request.verb, path = %request.endpoint_path))]
    pub async fn send_as<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let (status, body) = self.dispatch(&request).await?;
        serde_json::from_value(body.clone()).map_err(|err| {
            ApiError::invalid_response(
                request.verb,
                &request.endpoint_path,
                status,
                format!("unexpected response shape: {err}"),
                Some(body),
            )
            .into()
        })
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<(u16, Value)> {
        let verb = request.verb;
        let endpoint = request.endpoint_path.as_str();
        let mut refreshed = false;

        loop {
            // Reread on every attempt; a refresh or another process may have
            // replaced the token since the last one.
            let token =
                if request.requires_auth { self.store.access_token()? } else { None };
            let authenticated = token.is_some();

            let raw = self.execute(request, token.as_deref()).await?;

            if raw.status == 401 && authenticated {
                if refreshed {
                    warn!(%verb, endpoint, "Refreshed access token was rejected");
                    return Err(ApiError::unauthenticated(
                        verb,
                        endpoint,
                        "the refreshed access token was rejected",
                    )
                    .into());
                }

                refreshed = true;
                debug!(%verb, endpoint, "Access token rejected, refreshing");
                if let Err(failure) =
                    self.refresher.refresh(request.verify_tls, request.timeout).await
                {
                    return Err(ApiError::unauthenticated(verb, endpoint, failure).into());
                }
                continue;
            }

            let body = response::interpret(verb, endpoint, &raw)?;
            info!(%verb, endpoint, status = raw.status, "API request successful");
            return Ok((raw.status, body));
        }
    }

    async fn execute(&self, request: &ApiRequest, token: Option<&str>) -> Result<RawResponse> {
        let url = self.server.url_for(&request.path_and_query());
        let mut http = HttpRequest::new(request.verb, url)
            .verify_tls(request.verify_tls)
            .timeout(request.timeout);
        if let Some(token) = token {
            http = http.bearer(token);
        }
        if let Some(body) = &request.json_body {
            http = http.json(body.clone());
        }

        debug!(verb = %request.verb, url = %http.url, authenticated = token.is_some(), "API request");

        self.transport.send(http).await.map_err(|err| {
            warn!(verb = %request.verb, endpoint = %request.endpoint_path, error = %err, "API request failed");
            response::transport_error(request.verb, &request.endpoint_path, &err).into()
        })
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    store: Option<ConfigStore>,
    transport: Option<Arc<dyn HttpTransport>>,
    config: ApiClientConfig,
}

impl ApiClientBuilder {
    pub fn store(mut self, store: ConfigStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn refresh_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.refresh_endpoint = endpoint.into();
        self
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.config.verify_tls = verify;
        self
    }

    /// Build the API client
    ///
    /// Without an explicit transport a default [`crate::http::ReqwestTransport`]
    /// is built.
    ///
    /// # Errors
    ///
    /// Returns an error if no store is set, the store has no server, or the
    /// default transport cannot be built.
    pub fn build(self) -> Result<ApiClient> {
        let store = self.store.ok_or(ConfigurationError::MissingBaseUrl)?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                crate::http::ReqwestTransport::builder()
                    .timeout(self.config.timeout)
                    .build()
                    .map_err(agentcore_domain::AgentCoreError::unexpected)?,
            ),
        };

        Ok(ApiClient::new(store, transport, self.config)?)
    }
}
