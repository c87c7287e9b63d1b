//! Request and response records for the backend resources
//!
//! The backend owns these shapes; the records only name the fields the CLI
//! reads or renders. Unknown fields are kept in `extra` so JSON output shows
//! the full payload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::impl_wire_name_conversions;

/// Identifiers arrive as numbers from some endpoints and strings from others
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number identifier, got {other}"
            ))),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A list endpoint's body, plain or paginated (`{"count": n, "results": [...]}`)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Plain(items) | Self::Paged { results: items } => items,
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user_id: ResourceId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: ResourceId,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

// ============================================================================
// Data sources and versions
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub source_type: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ResourceId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewDataSource {
    pub name: String,
    pub source_type: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataVersion {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<ResourceId>,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewDataVersion {
    pub data_source: String,
    pub tag: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Sample rows of a data version
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataPreview {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One event in a data version's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, alias = "action")]
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, alias = "timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Experiments
// ============================================================================

/// Lifecycle stage an experiment can be promoted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStage {
    Staging,
    Production,
    Archived,
}

impl_wire_name_conversions!(ModelStage {
    Staging => "staging",
    Production => "production",
    Archived => "archived",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: ResourceId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ResourceId>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunExperiment {
    pub project: String,
    pub data_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromoteExperiment {
    pub stage: ModelStage,
}

// ============================================================================
// Deployments
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: ResourceId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment: Option<ResourceId>,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub replicas: u32,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewDeployment {
    pub name: String,
    pub experiment: String,
    pub target: String,
    pub replicas: u32,
}

// ============================================================================
// Cloud credentials
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Gcp,
    Azure,
}

impl_wire_name_conversions!(CloudProvider {
    Aws => "aws",
    Gcp => "gcp",
    Azure => "azure",
});

/// Stored credential metadata; secrets are write-only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Serialize)]
pub struct NewCredential {
    pub name: String,
    pub provider: CloudProvider,
    pub secrets: Map<String, Value>,
}

impl std::fmt::Debug for NewCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewCredential")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("secrets", &self.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_resource_id_accepts_numbers_and_strings() {
        let numeric: ResourceId = serde_json::from_value(json!(42)).unwrap();
        let text: ResourceId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(numeric.0, "42");
        assert_eq!(text.0, "abc");
        assert!(serde_json::from_value::<ResourceId>(json!(null)).is_err());
    }

    #[test]
    fn test_project_keeps_unknown_fields() {
        let project: Project = serde_json::from_value(json!({
            "id": 1,
            "name": "churn",
            "owner": "u1"
        }))
        .unwrap();
        assert_eq!(project.description, "");
        assert_eq!(project.extra.get("owner"), Some(&json!("u1")));

        let back = serde_json::to_value(&project).unwrap();
        assert_eq!(back["owner"], json!("u1"));
        assert_eq!(back["id"], json!("1"));
    }

    #[test]
    fn test_login_response_with_numeric_user_id() {
        let response: LoginResponse =
            serde_json::from_value(json!({"access": "A", "refresh": "R", "user_id": 7})).unwrap();
        assert_eq!(response.user_id.to_string(), "7");
    }

    #[test]
    fn test_listing_accepts_plain_and_paged() {
        let plain: Listing<Project> =
            serde_json::from_value(json!([{"id": 1, "name": "a"}])).unwrap();
        let paged: Listing<Project> = serde_json::from_value(json!({
            "count": 1,
            "next": null,
            "results": [{"id": 2, "name": "b"}]
        }))
        .unwrap();
        assert_eq!(plain.into_items()[0].name, "a");
        assert_eq!(paged.into_items()[0].id.to_string(), "2");
    }

    #[test]
    fn test_history_entry_aliases() {
        let entry: HistoryEntry = serde_json::from_value(json!({
            "action": "created",
            "timestamp": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(entry.event, "created");
        assert_eq!(entry.created_at.as_deref(), Some("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn test_promote_payload() {
        let body = serde_json::to_value(PromoteExperiment { stage: ModelStage::Production }).unwrap();
        assert_eq!(body, json!({"stage": "production"}));
    }

    #[test]
    fn test_new_credential_debug_hides_secret_values() {
        let mut secrets = Map::new();
        secrets.insert("secret_access_key".into(), json!("very-secret"));
        let credential =
            NewCredential { name: "prod".into(), provider: CloudProvider::Aws, secrets };
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("secret_access_key"));
        assert!(!rendered.contains("very-secret"));
    }
}
