//! Access-token refresh
//!
//! Exchanges the stored refresh token for a new access token. Any failure
//! clears the session before it is reported, so the caller lands in the
//! anonymous state and the next command asks for a login.

use std::sync::Arc;
use std::time::Duration;

use agentcore_domain::{ConfigurationError, RefreshResponse, ServerBinding, TokenKind, Verb};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::http::{HttpRequest, HttpTransport, TransportError};

/// Why a refresh did not produce a new access token
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RefreshFailure {
    #[error("no refresh token stored")]
    MissingRefreshToken,

    #[error("refresh rejected with status {0}")]
    Rejected(u16),

    #[error("refresh response carried no access token")]
    MissingAccessToken,

    #[error("refresh request failed: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigurationError),
}

/// Runs the refresh exchange against one server
pub struct TokenRefresher {
    store: ConfigStore,
    transport: Arc<dyn HttpTransport>,
    url: String,
}

impl TokenRefresher {
    pub fn new(
        store: ConfigStore,
        transport: Arc<dyn HttpTransport>,
        server: &ServerBinding,
        refresh_endpoint: &str,
    ) -> Self {
        Self { store, transport, url: server.url_for(refresh_endpoint) }
    }

    /// Mint and persist a new access token
    ///
    /// On failure the session has already been cleared when this returns.
    ///
    /// # Errors
    /// Returns the [`RefreshFailure`] that ended the exchange.
    pub async fn refresh(&self, verify_tls: bool, timeout: Duration) -> Result<(), RefreshFailure> {
        let outcome = self.exchange(verify_tls, timeout).await.and_then(|access| {
            self.store.set_token(TokenKind::Access, &access).map_err(RefreshFailure::from)
        });

        match outcome {
            Ok(()) => {
                info!("Access token refreshed");
                Ok(())
            }
            Err(failure) => {
                warn!(reason = %failure, "Token refresh failed, clearing session");
                if let Err(err) = self.store.clear_session() {
                    warn!(error = %err, "Failed to clear session after refresh failure");
                }
                Err(failure)
            }
        }
    }

    async fn exchange(&self, verify_tls: bool, timeout: Duration) -> Result<String, RefreshFailure> {
        let refresh = self.store.refresh_token()?.ok_or(RefreshFailure::MissingRefreshToken)?;

        // Never carries the rejected access token
        let request = HttpRequest::new(Verb::Post, self.url.as_str())
            .json(json!({ "refresh": refresh }))
            .verify_tls(verify_tls)
            .timeout(timeout);

        debug!(url = %self.url, "Requesting new access token");
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(RefreshFailure::Rejected(response.status));
        }

        serde_json::from_slice::<RefreshResponse>(&response.body)
            .ok()
            .map(|body| body.access)
            .filter(|access| !access.is_empty())
            .ok_or(RefreshFailure::MissingAccessToken)
    }
}

#[cfg(test)]
mod tests {
    use agentcore_domain::Session;

    use super::*;
    use crate::http::RawResponse;
    use crate::testing::{temp_store, ScriptedTransport};

    fn refresher(store: &ConfigStore, transport: &Arc<ScriptedTransport>) -> TokenRefresher {
        let server = ServerBinding::parse("https://x").unwrap();
        TokenRefresher::new(store.clone(), transport.clone(), &server, "/api/token/refresh/")
    }

    #[tokio::test]
    async fn test_successful_refresh_persists_access_only() {
        let (_dir, store) = temp_store();
        store.save_session(&Session::new("A1", "R1", "u1", "u@x")).unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_response(RawResponse::json(200, &json!({"access": "A2"})));

        refresher(&store, &transport).refresh(true, Duration::from_secs(5)).await.unwrap();

        let session = store.session().unwrap().unwrap();
        assert_eq!(session.access_token, "A2");
        assert_eq!(session.refresh_token, "R1");

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://x/api/token/refresh/");
        assert_eq!(sent[0].json_body, Some(json!({"refresh": "R1"})));
        assert_eq!(sent[0].header_value("authorization"), None);
    }

    #[tokio::test]
    async fn test_rejected_refresh_clears_session() {
        let (_dir, store) = temp_store();
        store.save_session(&Session::new("A1", "R1", "u1", "u@x")).unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_response(RawResponse::json(401, &json!({"detail": "expired"})));

        let failure =
            refresher(&store, &transport).refresh(true, Duration::from_secs(5)).await.unwrap_err();

        assert_eq!(failure, RefreshFailure::Rejected(401));
        assert_eq!(store.session().unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_access_in_body_clears_session() {
        let (_dir, store) = temp_store();
        store.save_session(&Session::new("A1", "R1", "u1", "u@x")).unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_response(RawResponse::json(200, &json!({"token": "A2"})));

        let failure =
            refresher(&store, &transport).refresh(true, Duration::from_secs(5)).await.unwrap_err();

        assert_eq!(failure, RefreshFailure::MissingAccessToken);
        assert_eq!(store.session().unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_skips_network() {
        let (_dir, store) = temp_store();
        let transport = Arc::new(ScriptedTransport::new());

        let failure =
            refresher(&store, &transport).refresh(true, Duration::from_secs(5)).await.unwrap_err();

        assert_eq!(failure, RefreshFailure::MissingRefreshToken);
        assert!(transport.requests().is_empty());
    }

    /// Answers the refresh exchange, then breaks the config file before the
    /// new token can be written
    struct CorruptingTransport {
        inner: ScriptedTransport,
        config_path: std::path::PathBuf,
    }

    #[async_trait::async_trait]
    impl HttpTransport for CorruptingTransport {
        async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
            std::fs::write(&self.config_path, "not json").unwrap();
            self.inner.send(request).await
        }
    }

    #[tokio::test]
    async fn test_failure_to_persist_new_token_is_a_refresh_failure() {
        let (_dir, store) = temp_store();
        store.save_session(&Session::new("A1", "R1", "u1", "u@x")).unwrap();
        let inner = ScriptedTransport::new();
        inner.push_response(RawResponse::json(200, &json!({"access": "A2"})));
        let transport =
            Arc::new(CorruptingTransport { inner, config_path: store.path().to_path_buf() });
        let server = ServerBinding::parse("https://x").unwrap();
        let refresher =
            TokenRefresher::new(store.clone(), transport, &server, "/api/token/refresh/");

        let failure = refresher.refresh(true, Duration::from_secs(5)).await.unwrap_err();

        assert!(
            matches!(failure, RefreshFailure::Config(ConfigurationError::Malformed { .. })),
            "got {failure:?}"
        );
        // The clear attempt must not clobber a file it cannot parse
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "not json");
    }

    #[tokio::test]
    async fn test_transport_failure_clears_session() {
        let (_dir, store) = temp_store();
        store.save_session(&Session::new("A1", "R1", "u1", "u@x")).unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_error(TransportError::Connect("refused".into()));

        let failure =
            refresher(&store, &transport).refresh(true, Duration::from_secs(5)).await.unwrap_err();

        assert!(matches!(failure, RefreshFailure::Transport(_)));
        assert_eq!(store.session().unwrap(), None);
    }
}
