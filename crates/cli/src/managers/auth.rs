//! Login, logout and session inspection

use agentcore_domain::endpoints::{LOGIN, USER_ME};
use agentcore_domain::{
    ConfigurationError, LoginRequest, LoginResponse, Result, ServerBinding, Session, UserProfile,
    Verb,
};
use agentcore_infra::ConfigStore;
use serde::Serialize;
use tracing::info;

use super::base::{BaseManager, ResourceManager};

/// Local view of the session, no network involved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub base_url: Option<String>,
    pub logged_in: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub logged_in_at: Option<String>,
}

pub struct AuthManager {
    base: BaseManager,
}

impl ResourceManager for AuthManager {
    const COLUMNS: &'static [&'static str] = &["id", "email", "username"];

    fn base(&self) -> &BaseManager {
        &self.base
    }
}

impl AuthManager {
    /// Columns of [`SessionStatus`]
    pub const STATUS_COLUMNS: &'static [&'static str] =
        &["base_url", "logged_in", "user_id", "email", "logged_in_at"];

    pub fn new(base: BaseManager) -> Self {
        Self { base }
    }

    /// Validate and store the server URL
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidBaseUrl` for unusable URLs.
    pub fn configure(
        store: &ConfigStore,
        base_url: &str,
    ) -> std::result::Result<ServerBinding, ConfigurationError> {
        let binding = store.set_base_url(base_url)?;
        info!(base_url = %binding.base_url(), "Server configured");
        Ok(binding)
    }

    /// Drop the stored session; returns whether one existed
    ///
    /// # Errors
    ///
    /// Returns an error if the config document cannot be read or written.
    pub fn logout(store: &ConfigStore) -> std::result::Result<bool, ConfigurationError> {
        let had_session = store.session()?.is_some();
        store.clear_session()?;
        info!(had_session, "Logged out");
        Ok(had_session)
    }

    /// Summarize the stored server and session
    ///
    /// # Errors
    ///
    /// Returns an error if the config document cannot be read.
    pub fn status(store: &ConfigStore) -> std::result::Result<SessionStatus, ConfigurationError> {
        let session = store.session()?;
        Ok(SessionStatus {
            base_url: store.base_url()?,
            logged_in: session.is_some(),
            user_id: session.as_ref().map(|s| s.user_id.clone()),
            email: session
                .as_ref()
                .and_then(|s| s.email.clone())
                .or(store.remembered_login_email()?),
            logged_in_at: session.and_then(|s| s.logged_in_at),
        })
    }

    /// Exchange credentials for tokens and persist the session
    ///
    /// The password is sent once and never stored.
    ///
    /// # Errors
    ///
    /// Returns the API error when the backend rejects the credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let api = self.base.api();
        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let request = api.request(Verb::Post, LOGIN.path()).json(body).anonymous();

        let tokens: LoginResponse =
            self.base.execute_with_progress("Logging in", api.send_as(request)).await?;

        let session = Session::new(tokens.access, tokens.refresh, tokens.user_id.to_string(), email);
        let store = self.base.store();
        store.save_session(&session)?;
        store.remember_login_email(email)?;

        info!(user_id = %session.user_id, "Logged in");
        Ok(session)
    }

    /// Profile of the logged-in user
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::NotLoggedIn` without a session, or the
    /// API error.
    pub async fn whoami(&self) -> Result<UserProfile> {
        self.base.require_session()?;
        let api = self.base.api();
        self.base
            .execute_with_progress("Fetching profile", api.send_as(api.request(Verb::Get, USER_ME.path())))
            .await
    }
}

#[cfg(test)]
mod tests {
    use agentcore_infra::testing::{seeded_store, temp_store};

    use super::*;

    #[test]
    fn test_status_when_unconfigured() {
        let (_dir, store) = temp_store();
        let status = AuthManager::status(&store).unwrap();
        assert_eq!(
            status,
            SessionStatus {
                base_url: None,
                logged_in: false,
                user_id: None,
                email: None,
                logged_in_at: None
            }
        );
    }

    #[test]
    fn test_status_with_session() {
        let (_dir, store) = seeded_store("https://x", Some(Session::new("A", "R", "u1", "u@x")));
        let status = AuthManager::status(&store).unwrap();
        assert!(status.logged_in);
        assert_eq!(status.base_url.as_deref(), Some("https://x"));
        assert_eq!(status.user_id.as_deref(), Some("u1"));
        assert_eq!(status.email.as_deref(), Some("u@x"));
        assert!(status.logged_in_at.is_some());
    }

    #[test]
    fn test_status_after_logout_keeps_server() {
        let (_dir, store) = seeded_store("https://x", Some(Session::new("A", "R", "u1", "u@x")));
        assert!(AuthManager::logout(&store).unwrap());
        assert!(!AuthManager::logout(&store).unwrap());

        let status = AuthManager::status(&store).unwrap();
        assert!(!status.logged_in);
        assert_eq!(status.base_url.as_deref(), Some("https://x"));
        assert_eq!(status.email, None);
    }

    #[test]
    fn test_configure_rejects_bad_url() {
        let (_dir, store) = temp_store();
        let err = AuthManager::configure(&store, "localhost:8000").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidBaseUrl { .. }));
        assert_eq!(AuthManager::configure(&store, "https://x/").unwrap().base_url(), "https://x");
    }
}
