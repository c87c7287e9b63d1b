//! Experiments: listing, runs and promotion

use agentcore_domain::endpoints::{EXPERIMENTS, EXPERIMENT_DETAIL, PROMOTE_EXPERIMENT, RUN_EXPERIMENT};
use agentcore_domain::{
    Experiment, Listing, ModelStage, PromoteExperiment, Query, Result, RunExperiment, Verb,
};
use tracing::info;

use super::base::{BaseManager, ResourceManager};

pub struct ExperimentManager {
    base: BaseManager,
}

impl ResourceManager for ExperimentManager {
    const COLUMNS: &'static [&'static str] =
        &["id", "name", "project", "status", "stage", "created_at"];

    fn base(&self) -> &BaseManager {
        &self.base
    }
}

impl ExperimentManager {
    pub fn new(base: BaseManager) -> Self {
        Self { base }
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn list(&self, project: Option<&str>) -> Result<Vec<Experiment>> {
        self.base.require_session()?;
        let api = self.base.api();
        let request = api
            .request(Verb::Get, EXPERIMENTS.path())
            .query(Query::new().optional("project", project));
        let listing: Listing<Experiment> =
            self.base.execute_with_progress("Fetching experiments", api.send_as(request)).await?;
        Ok(listing.into_items())
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn get(&self, experiment_id: &str) -> Result<Experiment> {
        self.base.require_session()?;
        let api = self.base.api();
        let path = EXPERIMENT_DETAIL.resolve(&[("experiment_id", experiment_id)])?;
        self.base
            .execute_with_progress("Fetching experiment", api.send_as(api.request(Verb::Get, path)))
            .await
    }

    /// Start a training run
    ///
    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn run(&self, run: RunExperiment) -> Result<Experiment> {
        self.base.require_session()?;
        let api = self.base.api();
        let request = api.request(Verb::Post, RUN_EXPERIMENT.path()).json(serde_json::to_value(run)?);
        let experiment: Experiment =
            self.base.execute_with_progress("Starting experiment", api.send_as(request)).await?;
        info!(experiment_id = %experiment.id, "Experiment started");
        Ok(experiment)
    }

    /// Move an experiment's model to `stage`
    ///
    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn promote(&self, experiment_id: &str, stage: ModelStage) -> Result<Experiment> {
        self.base.require_session()?;
        let api = self.base.api();
        let path = PROMOTE_EXPERIMENT.resolve(&[("experiment_id", experiment_id)])?;
        let request =
            api.request(Verb::Post, path).json(serde_json::to_value(PromoteExperiment { stage })?);
        self.base.execute_with_progress("Promoting experiment", api.send_as(request)).await
    }
}
