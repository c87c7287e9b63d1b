//! Durable per-user configuration
//!
//! One JSON document at `<config_dir>/config.json`:
//!
//! ```text
//! {
//!   "server":  {"base_url": "https://…"},
//!   "session": {"access_token": "…", "refresh_token": "…", "user_id": "…",
//!               "email": "…", "logged_in_at": "YYYY-MM-DD HH:MM:SS"},
//!   "login":   {"email": "…"}
//! }
//! ```
//!
//! Every operation rereads the file; nothing is cached, so a token refreshed by
//! one process is visible to the next call of another. Writes go to a temp
//! file in the same directory and are renamed over the document, so readers
//! see either the old or the new document and never a partial one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use agentcore_domain::{ConfigurationError, ServerBinding, Session, TokenKind};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::debug;

use super::paths::resolve_config_dir;

/// File name of the config document
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const KEY_BASE_URL: &str = "server.base_url";
pub const KEY_LOGIN_EMAIL: &str = "login.email";

const SESSION_SECTION: &str = "session";
const LOGIN_SECTION: &str = "login";

type Document = Map<String, Value>;

/// Handle on the config document; cheap to clone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Bind to the config directory resolved from `explicit_dir`, the
    /// environment, or the home directory
    ///
    /// # Errors
    /// Returns `ConfigurationError::NoConfigDir` if no directory can be found.
    pub fn open(explicit_dir: Option<PathBuf>) -> Result<Self, ConfigurationError> {
        let dir = resolve_config_dir(explicit_dir)?;
        Ok(Self::in_dir(dir))
    }

    /// Bind to `<dir>/config.json` without touching the filesystem
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { path: dir.into().join(CONFIG_FILE_NAME) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    // ------------------------------------------------------------------
    // Generic key access
    // ------------------------------------------------------------------

    /// Look up a dotted key such as `session.access_token`
    ///
    /// # Errors
    /// Returns `ConfigurationError::Malformed` if the document cannot be
    /// parsed. A missing file or key is `Ok(None)`.
    pub fn get(&self, key: &str) -> Result<Option<Value>, ConfigurationError> {
        let doc = self.load()?;
        Ok(lookup(&doc, key).cloned())
    }

    /// String value of a dotted key; empty strings count as absent
    ///
    /// # Errors
    /// See [`ConfigStore::get`].
    pub fn get_str(&self, key: &str) -> Result<Option<String>, ConfigurationError> {
        Ok(self.get(key)?.and_then(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }))
    }

    /// Merge one key into the document
    ///
    /// # Errors
    /// Returns an error if the document is malformed or cannot be written.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), ConfigurationError> {
        let value = value.into();
        self.update(|doc| insert(doc, key, value))
    }

    /// Remove one key; missing keys are ignored
    ///
    /// # Errors
    /// Returns an error if the document is malformed or cannot be written.
    pub fn remove(&self, key: &str) -> Result<(), ConfigurationError> {
        self.update(|doc| {
            remove(doc, key);
        })
    }

    /// Read-modify-write the whole document in one atomic replace
    ///
    /// # Errors
    /// Returns an error if the document is malformed or cannot be written.
    pub fn update<F, R>(&self, f: F) -> Result<R, ConfigurationError>
    where
        F: FnOnce(&mut Document) -> R,
    {
        let mut doc = self.load()?;
        let result = f(&mut doc);
        self.write(&doc)?;
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Server binding
    // ------------------------------------------------------------------

    /// Stored base URL, unvalidated
    ///
    /// # Errors
    /// See [`ConfigStore::get`].
    pub fn base_url(&self) -> Result<Option<String>, ConfigurationError> {
        self.get_str(KEY_BASE_URL)
    }

    /// The configured server, if any
    ///
    /// # Errors
    /// Returns an error if the document is malformed or the stored URL is
    /// invalid.
    pub fn server_binding(&self) -> Result<Option<ServerBinding>, ConfigurationError> {
        self.base_url()?.map(|raw| ServerBinding::parse(&raw)).transpose()
    }

    /// The configured server
    ///
    /// # Errors
    /// Returns `ConfigurationError::MissingBaseUrl` when unconfigured.
    pub fn require_server_binding(&self) -> Result<ServerBinding, ConfigurationError> {
        self.server_binding()?.ok_or(ConfigurationError::MissingBaseUrl)
    }

    /// Validate and store the base URL
    ///
    /// # Errors
    /// Returns `ConfigurationError::InvalidBaseUrl` for unusable URLs.
    pub fn set_base_url(&self, raw: &str) -> Result<ServerBinding, ConfigurationError> {
        let binding = ServerBinding::parse(raw)?;
        self.set(KEY_BASE_URL, binding.base_url())?;
        debug!(base_url = %binding.base_url(), "Server configured");
        Ok(binding)
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    /// The stored session, or `None` when absent or only partially written
    ///
    /// # Errors
    /// Returns `ConfigurationError::Malformed` if the document cannot be
    /// parsed.
    pub fn session(&self) -> Result<Option<Session>, ConfigurationError> {
        let Some(section) = self.get(SESSION_SECTION)? else {
            return Ok(None);
        };
        Ok(serde_json::from_value::<Session>(section).ok().and_then(Session::validated))
    }

    /// Access token of a complete session
    ///
    /// # Errors
    /// See [`ConfigStore::session`].
    pub fn access_token(&self) -> Result<Option<String>, ConfigurationError> {
        Ok(self.session()?.map(|session| session.access_token))
    }

    /// Refresh token of a complete session
    ///
    /// # Errors
    /// See [`ConfigStore::session`].
    pub fn refresh_token(&self) -> Result<Option<String>, ConfigurationError> {
        Ok(self.session()?.map(|session| session.refresh_token))
    }

    /// Replace the whole session section in one write
    ///
    /// # Errors
    /// Returns an error if the document is malformed or cannot be written.
    pub fn save_session(&self, session: &Session) -> Result<(), ConfigurationError> {
        let section = serde_json::to_value(session).map_err(|e| self.malformed(e))?;
        self.update(|doc| {
            doc.insert(SESSION_SECTION.to_string(), section);
        })?;
        debug!(user_id = %session.user_id, "Session saved");
        Ok(())
    }

    /// Overwrite one token of the session
    ///
    /// # Errors
    /// Returns an error if the document is malformed or cannot be written.
    pub fn set_token(&self, kind: TokenKind, value: &str) -> Result<(), ConfigurationError> {
        self.set(kind.config_key(), value)?;
        debug!(token = %kind, "Token updated");
        Ok(())
    }

    /// Drop every `session.*` and `login.*` key in one write
    ///
    /// # Errors
    /// Returns an error if the document is malformed or cannot be written.
    pub fn clear_session(&self) -> Result<(), ConfigurationError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|doc| {
            doc.remove(SESSION_SECTION);
            doc.remove(LOGIN_SECTION);
        })?;
        debug!("Session cleared");
        Ok(())
    }

    /// Remember the last email used to log in
    ///
    /// # Errors
    /// Returns an error if the document is malformed or cannot be written.
    pub fn remember_login_email(&self, email: &str) -> Result<(), ConfigurationError> {
        self.set(KEY_LOGIN_EMAIL, email)
    }

    /// Email remembered from the last login
    ///
    /// # Errors
    /// See [`ConfigStore::get`].
    pub fn remembered_login_email(&self) -> Result<Option<String>, ConfigurationError> {
        self.get_str(KEY_LOGIN_EMAIL)
    }

    // ------------------------------------------------------------------
    // File handling
    // ------------------------------------------------------------------

    fn load(&self) -> Result<Document, ConfigurationError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if contents.trim().is_empty() {
            return Ok(Document::new());
        }

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(doc)) => Ok(doc),
            Ok(_) => Err(self.malformed("top-level value is not an object")),
            Err(e) => Err(self.malformed(e)),
        }
    }

    fn write(&self, doc: &Document) -> Result<(), ConfigurationError> {
        let dir = self.dir();
        create_private_dir(dir).map_err(|e| self.io_error(e))?;

        let mut contents = serde_json::to_vec_pretty(doc).map_err(|e| self.malformed(e))?;
        contents.push(b'\n');

        // Same directory as the target so the rename stays on one filesystem
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        restrict_to_owner(tmp.as_file()).map_err(|e| self.io_error(e))?;
        tmp.write_all(&contents).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        debug!(path = %self.path.display(), "Config written");
        Ok(())
    }

    fn malformed(&self, reason: impl ToString) -> ConfigurationError {
        ConfigurationError::Malformed {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn io_error(&self, err: std::io::Error) -> ConfigurationError {
        ConfigurationError::Io { path: self.path.display().to_string(), reason: err.to_string() }
    }
}

fn lookup<'a>(doc: &'a Document, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let first = segments.next()?;
    segments.try_fold(doc.get(first)?, |value, segment| value.as_object()?.get(segment))
}

fn insert(doc: &mut Document, key: &str, value: Value) {
    let mut segments: Vec<&str> = key.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut current = doc;
    for segment in segments {
        let entry = current.entry(segment.to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert(leaf.to_string(), value);
}

fn remove(doc: &mut Document, key: &str) {
    match key.rsplit_once('.') {
        None => {
            doc.remove(key);
        }
        Some((parent, leaf)) => {
            let mut current = doc;
            for segment in parent.split('.') {
                match current.get_mut(segment) {
                    Some(Value::Object(next)) => current = next,
                    _ => return,
                }
            }
            current.remove(leaf);
        }
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    if dir.is_dir() {
        return Ok(());
    }
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn restrict_to_owner(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}
