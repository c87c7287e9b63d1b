//! Deployments

use agentcore_domain::endpoints::{DEPLOYMENTS, DEPLOYMENT_DETAIL};
use agentcore_domain::{Deployment, Listing, NewDeployment, Result, Verb};

use super::base::{BaseManager, ResourceManager};

pub struct DeployManager {
    base: BaseManager,
}

impl ResourceManager for DeployManager {
    const COLUMNS: &'static [&'static str] =
        &["id", "name", "experiment", "target", "replicas", "status"];

    fn base(&self) -> &BaseManager {
        &self.base
    }
}

impl DeployManager {
    pub fn new(base: BaseManager) -> Self {
        Self { base }
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn list(&self) -> Result<Vec<Deployment>> {
        self.base.require_session()?;
        let api = self.base.api();
        let listing: Listing<Deployment> = self
            .base
            .execute_with_progress(
                "Fetching deployments",
                api.send_as(api.request(Verb::Get, DEPLOYMENTS.path())),
            )
            .await?;
        Ok(listing.into_items())
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn create(&self, deployment: NewDeployment) -> Result<Deployment> {
        self.base.require_session()?;
        let api = self.base.api();
        let request =
            api.request(Verb::Post, DEPLOYMENTS.path()).json(serde_json::to_value(deployment)?);
        self.base.execute_with_progress("Creating deployment", api.send_as(request)).await
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn delete(&self, deployment_id: &str) -> Result<()> {
        self.base.require_session()?;
        let path = DEPLOYMENT_DETAIL.resolve(&[("deployment_id", deployment_id)])?;
        self.base.execute_with_progress("Deleting deployment", self.base.api().delete(&path)).await?;
        Ok(())
    }
}
