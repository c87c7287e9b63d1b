//! Projects

use agentcore_domain::endpoints::{PROJECTS, PROJECT_DETAIL};
use agentcore_domain::{Listing, NewProject, Project, Result, Verb};

use super::base::{BaseManager, ResourceManager};

pub struct ProjectManager {
    base: BaseManager,
}

impl ResourceManager for ProjectManager {
    const COLUMNS: &'static [&'static str] = &["id", "name", "description", "created_at"];

    fn base(&self) -> &BaseManager {
        &self.base
    }
}

impl ProjectManager {
    pub fn new(base: BaseManager) -> Self {
        Self { base }
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn list(&self) -> Result<Vec<Project>> {
        self.base.require_session()?;
        let api = self.base.api();
        let listing: Listing<Project> = self
            .base
            .execute_with_progress("Fetching projects", api.send_as(api.request(Verb::Get, PROJECTS.path())))
            .await?;
        Ok(listing.into_items())
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn get(&self, project_id: &str) -> Result<Project> {
        self.base.require_session()?;
        let api = self.base.api();
        let path = PROJECT_DETAIL.resolve(&[("project_id", project_id)])?;
        self.base
            .execute_with_progress("Fetching project", api.send_as(api.request(Verb::Get, path)))
            .await
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn create(&self, name: &str, description: &str) -> Result<Project> {
        self.base.require_session()?;
        let api = self.base.api();
        let body = serde_json::to_value(NewProject {
            name: name.to_string(),
            description: description.to_string(),
        })?;
        let request = api.request(Verb::Post, PROJECTS.path()).json(body);
        self.base.execute_with_progress("Creating project", api.send_as(request)).await
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn delete(&self, project_id: &str) -> Result<()> {
        self.base.require_session()?;
        let path = PROJECT_DETAIL.resolve(&[("project_id", project_id)])?;
        self.base.execute_with_progress("Deleting project", self.base.api().delete(&path)).await?;
        Ok(())
    }
}
