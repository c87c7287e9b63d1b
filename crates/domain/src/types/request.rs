//! Request values built per call
//!
//! An [`ApiRequest`] is constructed by a manager, handed to the ApiClient and
//! dropped once the call returns. Nothing here is ever persisted.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single query parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Single(String),
    /// Sent as one comma-joined value (`columns=a,b,c`)
    List(Vec<String>),
}

/// Ordered query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, QueryValue)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scalar parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((key.into(), QueryValue::Single(value.to_string())));
        self
    }

    /// Add a scalar parameter when a value is present
    #[must_use]
    pub fn optional<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Add a list parameter; empty lists are skipped
    #[must_use]
    pub fn list<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.pairs.push((key.into(), QueryValue::List(values)));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encode as `k=v&k2=a,b` without the leading `?`
    ///
    /// Keys and values are percent-encoded; list items are encoded one by
    /// one so the joining commas stay literal.
    pub fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| {
                let encoded = match value {
                    QueryValue::Single(v) => urlencoding::encode(v).into_owned(),
                    QueryValue::List(items) => items
                        .iter()
                        .map(|item| urlencoding::encode(item).into_owned())
                        .collect::<Vec<_>>()
                        .join(","),
                };
                format!("{}={}", urlencoding::encode(key), encoded)
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// One call against the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub verb: Verb,
    pub endpoint_path: String,
    pub query: Query,
    pub json_body: Option<Value>,
    pub requires_auth: bool,
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl ApiRequest {
    pub fn new(verb: Verb, endpoint_path: impl Into<String>) -> Self {
        Self {
            verb,
            endpoint_path: endpoint_path.into(),
            query: Query::default(),
            json_body: None,
            requires_auth: true,
            verify_tls: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn get(endpoint_path: impl Into<String>) -> Self {
        Self::new(Verb::Get, endpoint_path)
    }

    pub fn post(endpoint_path: impl Into<String>) -> Self {
        Self::new(Verb::Post, endpoint_path)
    }

    pub fn put(endpoint_path: impl Into<String>) -> Self {
        Self::new(Verb::Put, endpoint_path)
    }

    pub fn patch(endpoint_path: impl Into<String>) -> Self {
        Self::new(Verb::Patch, endpoint_path)
    }

    pub fn delete(endpoint_path: impl Into<String>) -> Self {
        Self::new(Verb::Delete, endpoint_path)
    }

    #[must_use]
    pub fn query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.json_body = Some(body);
        self
    }

    /// Send without the bearer header (login, token refresh)
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.requires_auth = false;
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

    /// Path plus encoded query string
    pub fn path_and_query(&self) -> String {
        let path = if self.endpoint_path.starts_with('/') {
            self.endpoint_path.clone()
        } else {
            format!("/{}", self.endpoint_path)
        };

        if self.query.is_empty() {
            path
        } else {
            format!("{}?{}", path, self.query.encode())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_list_params_are_comma_joined() {
        let query = Query::new().list("columns", ["a", "b"]);
        assert_eq!(query.encode(), "columns=a,b");
    }

    #[test]
    fn test_list_items_are_escaped_individually() {
        let query = Query::new().list("columns", ["a b", "c,d"]);
        assert_eq!(query.encode(), "columns=a%20b,c%2Cd");
    }

    #[test]
    fn test_mixed_params_keep_order() {
        let query = Query::new()
            .param("project", 7)
            .optional::<String>("tag", None)
            .list("columns", Vec::<String>::new())
            .param("limit", 10);
        assert_eq!(query.encode(), "project=7&limit=10");
    }

    #[test]
    fn test_path_and_query_adds_leading_slash() {
        let request = ApiRequest::get("api/projects/").query(Query::new().param("page", 2));
        assert_eq!(request.path_and_query(), "/api/projects/?page=2");
    }

    #[test]
    fn test_defaults() {
        let request = ApiRequest::post("/api/projects/").json(json!({"name": "p"}));
        assert_eq!(request.verb, Verb::Post);
        assert!(request.requires_auth);
        assert!(request.verify_tls);
        assert_eq!(request.timeout, DEFAULT_TIMEOUT);
        assert!(!request.anonymous().requires_auth);
    }

    #[test]
    fn test_verb_display() {
        assert_eq!(Verb::Patch.to_string(), "PATCH");
        assert_eq!(serde_json::to_string(&Verb::Delete).unwrap(), "\"DELETE\"");
    }
}
