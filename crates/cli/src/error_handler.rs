//! Uniform failure handling for manager operations
//!
//! [`handle_api_error`] awaits an operation and turns every failure into a
//! rendered message plus `Err(Reported)`. Nothing escapes it, panics
//! included, so callers only ever branch on the tagged result.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use agentcore_domain::{AgentCoreError, ApiError, ConfigurationError, Result};
use futures::FutureExt;
use tracing::{error, warn};

use crate::console::Console;

/// Default cap on rendered response bodies
pub const DEFAULT_MAX_BODY_CHARS: usize = 500;

/// How much of a failure to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorOptions {
    /// Also render the response body and `VERB endpoint`
    pub show_details: bool,
    /// Body characters shown before truncation
    pub max_body_chars: usize,
}

impl Default for ErrorOptions {
    fn default() -> Self {
        Self { show_details: false, max_body_chars: DEFAULT_MAX_BODY_CHARS }
    }
}

impl ErrorOptions {
    /// Defaults plus details
    pub fn detailed() -> Self {
        Self { show_details: true, ..Self::default() }
    }
}

/// Marker for a failure that has already been shown to the user
#[derive(Debug, Clone)]
pub struct Reported {
    error: AgentCoreError,
}

impl Reported {
    pub fn error(&self) -> &AgentCoreError {
        &self.error
    }

    pub fn into_error(self) -> AgentCoreError {
        self.error
    }
}

/// Outcome of a handled operation; `Err` means "already reported, stop here"
pub type Handled<T> = std::result::Result<T, Reported>;

/// Await `operation`, rendering any failure on `console`
pub async fn handle_api_error<T, F>(
    console: &Console,
    options: ErrorOptions,
    operation: F,
) -> Handled<T>
where
    F: Future<Output = Result<T>>,
{
    let error = match AssertUnwindSafe(operation).catch_unwind().await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(error)) => error,
        Err(payload) => panic_error(payload.as_ref()),
    };

    render(console, options, &error);
    Err(Reported { error })
}

/// Render a failure the way [`handle_api_error`] does
pub fn render(console: &Console, options: ErrorOptions, error: &AgentCoreError) {
    match error {
        AgentCoreError::Api(err) => render_api_error(console, options, err),
        AgentCoreError::Config(err) => render_config_error(console, err),
        AgentCoreError::Unexpected { type_name, message } => {
            error!(type_name = %type_name, message = %message, "Unexpected error");
            console.panel("Unexpected error", [format!("Unexpected error: {type_name}: {message}")]);
        }
    }
}

fn render_api_error(console: &Console, options: ErrorOptions, err: &ApiError) {
    warn!(
        kind = %err.kind,
        status = ?err.status_code,
        verb = %err.verb,
        endpoint = %err.endpoint,
        message = %err.message,
        "API request failed"
    );

    let status = err.status_code.map_or_else(|| "n/a".to_string(), |code| code.to_string());
    let mut lines = vec![err.message.clone(), format!("Status: {status}")];

    if options.show_details {
        lines.push(format!("Request: {} {}", err.verb, err.endpoint));
        if let Some(body) = &err.body {
            let pretty = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
            lines.push(format!("Body: {}", truncate(&pretty, options.max_body_chars)));
        }
    }

    if err.is_unauthenticated() {
        lines.push("Your session has ended. Run `agentcore login` to sign in again.".to_string());
    }

    console.panel("API error", lines);
}

fn render_config_error(console: &Console, err: &ConfigurationError) {
    warn!(error = %err, "Configuration error");

    let hint = match err {
        ConfigurationError::NotLoggedIn | ConfigurationError::MissingLoginEmail => {
            "Run `agentcore login --email <email>` to sign in."
        }
        ConfigurationError::Malformed { .. } => {
            "Fix or remove the file, then run `agentcore configure --url <base-url>` and log in again."
        }
        _ => "Run `agentcore configure --url <base-url>` to set up the CLI.",
    };

    console.panel("Configuration error", [err.to_string(), hint.to_string()]);
}

fn panic_error(payload: &(dyn Any + Send)) -> AgentCoreError {
    let message = payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "operation panicked".to_string());

    AgentCoreError::Unexpected { type_name: "panic".to_string(), message }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
