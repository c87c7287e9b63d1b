//! Shared plumbing for resource managers

use std::future::Future;
use std::sync::Arc;

use agentcore_domain::{ConfigurationError, Result};
use agentcore_infra::{ApiClient, ApiClientConfig, ConfigStore, HttpTransport};

use crate::console::Console;
use crate::error_handler::{handle_api_error, ErrorOptions, Handled};
use crate::progress::ProgressReporter;

/// What every manager holds: the store, a client bound to its server, and
/// the terminal
#[derive(Clone)]
pub struct BaseManager {
    store: ConfigStore,
    api: Arc<ApiClient>,
    progress: ProgressReporter,
    console: Console,
}

impl BaseManager {
    /// Bind a client to the store's configured server
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingBaseUrl` when no server is
    /// configured.
    pub fn new(
        store: ConfigStore,
        console: Console,
        transport: Arc<dyn HttpTransport>,
        config: ApiClientConfig,
    ) -> std::result::Result<Self, ConfigurationError> {
        let api = ApiClient::new(store.clone(), transport, config)?;
        Ok(Self::with_client(store, console, Arc::new(api)))
    }

    pub fn with_client(store: ConfigStore, console: Console, api: Arc<ApiClient>) -> Self {
        let progress = ProgressReporter::new(console.clone());
        Self { store, api, progress, console }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn progress(&self) -> &ProgressReporter {
        &self.progress
    }

    /// Await `operation` behind a spinner labelled `label`
    pub async fn execute_with_progress<F: Future>(&self, label: &str, operation: F) -> F::Output {
        self.progress.run(label, operation).await
    }

    /// Await `operation`, rendering any failure on this manager's console
    pub async fn handle<T, F>(&self, options: ErrorOptions, operation: F) -> Handled<T>
    where
        F: Future<Output = Result<T>>,
    {
        handle_api_error(&self.console, options, operation).await
    }

    /// Fail fast when no session is stored
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::NotLoggedIn` without a complete session.
    pub fn require_session(&self) -> std::result::Result<(), ConfigurationError> {
        match self.store.session()? {
            Some(_) => Ok(()),
            None => Err(ConfigurationError::NotLoggedIn),
        }
    }
}

/// A manager for one family of backend resources
pub trait ResourceManager {
    /// Columns rendered for this manager's records in table output
    const COLUMNS: &'static [&'static str];

    fn base(&self) -> &BaseManager;
}
