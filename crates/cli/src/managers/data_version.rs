//! Data sources, data versions, previews and history

use agentcore_domain::endpoints::{
    DATA_SOURCES, DATA_VERSIONS, DATA_VERSION_DETAIL, DATA_VERSION_HISTORY, DATA_VERSION_PREVIEW,
};
use agentcore_domain::{
    DataPreview, DataSource, DataVersion, HistoryEntry, Listing, NewDataSource, NewDataVersion,
    Query, Result, Verb,
};

use super::base::{BaseManager, ResourceManager};

pub struct DataVersionManager {
    base: BaseManager,
}

impl ResourceManager for DataVersionManager {
    const COLUMNS: &'static [&'static str] =
        &["id", "data_source", "tag", "description", "created_at"];

    fn base(&self) -> &BaseManager {
        &self.base
    }
}

impl DataVersionManager {
    pub const SOURCE_COLUMNS: &'static [&'static str] =
        &["id", "name", "source_type", "uri", "project"];
    pub const HISTORY_COLUMNS: &'static [&'static str] = &["id", "event", "user", "created_at"];

    pub fn new(base: BaseManager) -> Self {
        Self { base }
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn list_sources(&self, project: Option<&str>) -> Result<Vec<DataSource>> {
        self.base.require_session()?;
        let api = self.base.api();
        let request = api
            .request(Verb::Get, DATA_SOURCES.path())
            .query(Query::new().optional("project", project));
        let listing: Listing<DataSource> =
            self.base.execute_with_progress("Fetching data sources", api.send_as(request)).await?;
        Ok(listing.into_items())
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn create_source(&self, source: NewDataSource) -> Result<DataSource> {
        self.base.require_session()?;
        let api = self.base.api();
        let request = api.request(Verb::Post, DATA_SOURCES.path()).json(serde_json::to_value(source)?);
        self.base.execute_with_progress("Registering data source", api.send_as(request)).await
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn list_versions(&self, data_source: Option<&str>) -> Result<Vec<DataVersion>> {
        self.base.require_session()?;
        let api = self.base.api();
        let request = api
            .request(Verb::Get, DATA_VERSIONS.path())
            .query(Query::new().optional("data_source", data_source));
        let listing: Listing<DataVersion> =
            self.base.execute_with_progress("Fetching data versions", api.send_as(request)).await?;
        Ok(listing.into_items())
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn get_version(&self, version_id: &str) -> Result<DataVersion> {
        self.base.require_session()?;
        let api = self.base.api();
        let path = DATA_VERSION_DETAIL.resolve(&[("version_id", version_id)])?;
        self.base
            .execute_with_progress("Fetching data version", api.send_as(api.request(Verb::Get, path)))
            .await
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn create_version(&self, version: NewDataVersion) -> Result<DataVersion> {
        self.base.require_session()?;
        let api = self.base.api();
        let request =
            api.request(Verb::Post, DATA_VERSIONS.path()).json(serde_json::to_value(version)?);
        self.base.execute_with_progress("Creating data version", api.send_as(request)).await
    }

    /// Sample rows, optionally restricted to `columns`
    ///
    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn preview(
        &self,
        version_id: &str,
        columns: &[String],
        limit: Option<u32>,
    ) -> Result<DataPreview> {
        self.base.require_session()?;
        let api = self.base.api();
        let path = DATA_VERSION_PREVIEW.resolve(&[("version_id", version_id)])?;
        let query = Query::new().list("columns", columns.iter().cloned()).optional("limit", limit);
        let request = api.request(Verb::Get, path).query(query);
        self.base.execute_with_progress("Loading preview", api.send_as(request)).await
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn history(&self, version_id: &str) -> Result<Vec<HistoryEntry>> {
        self.base.require_session()?;
        let api = self.base.api();
        let path = DATA_VERSION_HISTORY.resolve(&[("version_id", version_id)])?;
        let listing: Listing<HistoryEntry> = self
            .base
            .execute_with_progress("Fetching history", api.send_as(api.request(Verb::Get, path)))
            .await?;
        Ok(listing.into_items())
    }
}
