//! Endpoint registry
//!
//! Symbolic names for every backend path the CLI calls. Templates may carry
//! `{name}` placeholders which [`Endpoint::resolve`] fills in; values are
//! percent-encoded so a `/` inside an id becomes `%2F` instead of a new path
//! segment.

use crate::errors::ConfigurationError;

/// A named URL template relative to the base URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub name: &'static str,
    pub template: &'static str,
}

impl Endpoint {
    pub const fn new(name: &'static str, template: &'static str) -> Self {
        Self { name, template }
    }

    /// Substitute placeholders with URL-escaped values
    ///
    /// # Errors
    /// Returns `ConfigurationError::MissingPathParam` when the template names
    /// a placeholder that `params` does not supply.
    pub fn resolve(&self, params: &[(&str, &str)]) -> Result<String, ConfigurationError> {
        let mut resolved = String::with_capacity(self.template.len());
        let mut rest = self.template;

        while let Some(open) = rest.find('{') {
            resolved.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                // Unbalanced brace, copy the remainder verbatim
                resolved.push_str(&rest[open..]);
                return Ok(resolved);
            };

            let key = &after[..close];
            let value = params
                .iter()
                .find_map(|(name, value)| (*name == key).then_some(*value))
                .ok_or_else(|| ConfigurationError::MissingPathParam {
                    endpoint: self.name.to_string(),
                    param: key.to_string(),
                })?;
            resolved.push_str(&urlencoding::encode(value));
            rest = &after[close + 1..];
        }

        resolved.push_str(rest);
        Ok(resolved)
    }

    /// The template itself, for endpoints without placeholders
    pub const fn path(&self) -> &'static str {
        self.template
    }
}

// Authentication
pub const LOGIN: Endpoint = Endpoint::new("LOGIN", "/api/token/");
pub const TOKEN_REFRESH: Endpoint = Endpoint::new("TOKEN_REFRESH", "/api/token/refresh/");
pub const USER_ME: Endpoint = Endpoint::new("USER_ME", "/api/users/me/");

// Projects
pub const PROJECTS: Endpoint = Endpoint::new("PROJECTS", "/api/projects/");
pub const PROJECT_DETAIL: Endpoint = Endpoint::new("PROJECT_DETAIL", "/api/projects/{project_id}/");

// Data sources and versions
pub const DATA_SOURCES: Endpoint = Endpoint::new("DATA_SOURCES", "/api/data-sources/");
pub const DATA_SOURCE_DETAIL: Endpoint =
    Endpoint::new("DATA_SOURCE_DETAIL", "/api/data-sources/{source_id}/");
pub const DATA_VERSIONS: Endpoint = Endpoint::new("DATA_VERSIONS", "/api/data-versions/");
pub const DATA_VERSION_DETAIL: Endpoint =
    Endpoint::new("DATA_VERSION_DETAIL", "/api/data-versions/{version_id}/");
pub const DATA_VERSION_PREVIEW: Endpoint =
    Endpoint::new("DATA_VERSION_PREVIEW", "/api/data-versions/{version_id}/preview/");
pub const DATA_VERSION_HISTORY: Endpoint =
    Endpoint::new("DATA_VERSION_HISTORY", "/api/data-versions/{version_id}/history/");

// Experiments
pub const EXPERIMENTS: Endpoint = Endpoint::new("EXPERIMENTS", "/api/experiments/");
pub const EXPERIMENT_DETAIL: Endpoint =
    Endpoint::new("EXPERIMENT_DETAIL", "/api/experiments/{experiment_id}/");
pub const RUN_EXPERIMENT: Endpoint = Endpoint::new("RUN_EXPERIMENT", "/api/experiments/run/");
pub const PROMOTE_EXPERIMENT: Endpoint =
    Endpoint::new("PROMOTE_EXPERIMENT", "/api/experiments/{experiment_id}/promote/");

// Deployments
pub const DEPLOYMENTS: Endpoint = Endpoint::new("DEPLOYMENTS", "/api/deployments/");
pub const DEPLOYMENT_DETAIL: Endpoint =
    Endpoint::new("DEPLOYMENT_DETAIL", "/api/deployments/{deployment_id}/");

// Cloud credentials
pub const CREDENTIALS: Endpoint = Endpoint::new("CREDENTIALS", "/api/credentials/");
pub const CREDENTIAL_DETAIL: Endpoint =
    Endpoint::new("CREDENTIAL_DETAIL", "/api/credentials/{credential_id}/");

/// Every registered endpoint
pub const ALL: &[Endpoint] = &[
    LOGIN,
    TOKEN_REFRESH,
    USER_ME,
    PROJECTS,
    PROJECT_DETAIL,
    DATA_SOURCES,
    DATA_SOURCE_DETAIL,
    DATA_VERSIONS,
    DATA_VERSION_DETAIL,
    DATA_VERSION_PREVIEW,
    DATA_VERSION_HISTORY,
    EXPERIMENTS,
    EXPERIMENT_DETAIL,
    RUN_EXPERIMENT,
    PROMOTE_EXPERIMENT,
    DEPLOYMENTS,
    DEPLOYMENT_DETAIL,
    CREDENTIALS,
    CREDENTIAL_DETAIL,
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_placeholder_substitutes_verbatim() {
        let path = DATA_VERSION_PREVIEW.resolve(&[("version_id", "abc")]).unwrap();
        assert_eq!(path, "/api/data-versions/abc/preview/");
    }

    #[test]
    fn test_placeholder_value_with_slash_is_escaped() {
        let path = DATA_VERSION_PREVIEW.resolve(&[("version_id", "a/b")]).unwrap();
        assert_eq!(path, "/api/data-versions/a%2Fb/preview/");
    }

    #[test]
    fn test_missing_placeholder_is_an_error() {
        let err = PROJECT_DETAIL.resolve(&[("version_id", "1")]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingPathParam {
                endpoint: "PROJECT_DETAIL".into(),
                param: "project_id".into()
            }
        );
    }

    #[test]
    fn test_template_without_placeholders() {
        assert_eq!(PROJECTS.resolve(&[]).unwrap(), "/api/projects/");
        assert_eq!(PROJECTS.path(), "/api/projects/");
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = ALL.iter().map(|endpoint| endpoint.name).collect();
        assert_eq!(names.len(), ALL.len());
    }

    #[test]
    fn test_templates_are_well_formed() {
        for endpoint in ALL {
            assert!(endpoint.template.starts_with("/api/"), "{}", endpoint.name);
            assert!(endpoint.template.ends_with('/'), "{}", endpoint.name);
            assert!(!endpoint.template.contains('.'), "{}", endpoint.name);
        }
    }
}
