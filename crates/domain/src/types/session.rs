//! Session and server binding types

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;
use crate::impl_wire_name_conversions;

/// Format of `session.logged_in_at` in the config document
pub const LOGIN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which bearer token to update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl_wire_name_conversions!(TokenKind {
    Access => "access",
    Refresh => "refresh",
});

impl TokenKind {
    /// Key of this token under `session.*`
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Access => "session.access_token",
            Self::Refresh => "session.refresh_token",
        }
    }
}

/// The bundle produced by a successful login
///
/// Invariant: a session only exists when access token, refresh token and
/// user id are all present. Readers treat anything less as no session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged_in_at: Option<String>,
}

impl Session {
    /// New session stamped with the current UTC time
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user_id: user_id.into(),
            email: Some(email.into()),
            logged_in_at: Some(Utc::now().format(LOGIN_TIMESTAMP_FORMAT).to_string()),
        }
    }

    /// Parsed login timestamp, if present and well formed
    pub fn logged_in_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.logged_in_at.as_deref()?;
        NaiveDateTime::parse_from_str(raw, LOGIN_TIMESTAMP_FORMAT).ok().map(|naive| naive.and_utc())
    }

    fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty() && !self.user_id.is_empty()
    }

    /// Returns the session only if every required field is non-empty
    pub fn validated(self) -> Option<Self> {
        self.is_complete().then_some(self)
    }
}

// Tokens stay out of logs and panics.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("logged_in_at", &self.logged_in_at)
            .finish()
    }
}

/// The backend this client talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerBinding {
    base_url: String,
}

impl ServerBinding {
    /// Validate and normalize a base URL
    ///
    /// # Errors
    /// Returns `ConfigurationError::InvalidBaseUrl` unless the URL is
    /// absolute with an `http`/`https` scheme and a host.
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        let parsed = url::Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host"));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid("base URL must not carry a query or fragment"));
        }

        let normalized = parsed.as_str().trim_end_matches('/').to_string();
        Ok(Self { base_url: normalized })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path (with optional query) relative to the base
    pub fn url_for(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.base_url, path_and_query)
        } else {
            format!("{}/{}", self.base_url, path_and_query)
        }
    }
}
