//! Test doubles for the transport and the config store
//!
//! Available to this crate's tests and, through the `test-utils` feature, to
//! downstream crates.

// Test helpers panic on misuse; a failed lock fails the test anyway
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use agentcore_domain::Session;
use async_trait::async_trait;
use tempfile::TempDir;

use crate::config::ConfigStore;
use crate::http::{HttpRequest, HttpTransport, RawResponse, TransportError};

type Scripted = Result<RawResponse, TransportError>;

/// Transport that replays queued outcomes in order and records every request
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    outcomes: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn push_response(&self, response: RawResponse) {
        self.outcomes.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a transport failure
    pub fn push_error(&self, error: TransportError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    /// Every request sent so far, oldest first
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Outcomes not yet consumed
    pub fn remaining(&self) -> usize {
        self.outcomes.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request("no scripted response left".into())))
    }
}

/// Store in a fresh temp directory; keep the `TempDir` alive for the test
pub fn temp_store() -> (TempDir, ConfigStore) {
    let dir = TempDir::new().expect("temp dir");
    let store = ConfigStore::in_dir(dir.path());
    (dir, store)
}

/// Store bound to `base_url`, optionally holding a session
pub fn seeded_store(base_url: &str, session: Option<Session>) -> (TempDir, ConfigStore) {
    let (dir, store) = temp_store();
    store.set_base_url(base_url).expect("base url");
    if let Some(session) = session {
        store.save_session(&session).expect("session");
    }
    (dir, store)
}
