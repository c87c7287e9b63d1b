//! Cloud credentials
//!
//! Secret values are write-only: they are sent on create and never rendered.

use agentcore_domain::endpoints::{CREDENTIALS, CREDENTIAL_DETAIL};
use agentcore_domain::{Credential, Listing, NewCredential, Result, Verb};

use super::base::{BaseManager, ResourceManager};

pub struct CredentialManager {
    base: BaseManager,
}

impl ResourceManager for CredentialManager {
    const COLUMNS: &'static [&'static str] = &["id", "name", "provider", "created_at"];

    fn base(&self) -> &BaseManager {
        &self.base
    }
}

impl CredentialManager {
    pub fn new(base: BaseManager) -> Self {
        Self { base }
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn list(&self) -> Result<Vec<Credential>> {
        self.base.require_session()?;
        let api = self.base.api();
        let listing: Listing<Credential> = self
            .base
            .execute_with_progress(
                "Fetching credentials",
                api.send_as(api.request(Verb::Get, CREDENTIALS.path())),
            )
            .await?;
        Ok(listing.into_items())
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn create(&self, credential: NewCredential) -> Result<Credential> {
        self.base.require_session()?;
        let api = self.base.api();
        let request =
            api.request(Verb::Post, CREDENTIALS.path()).json(serde_json::to_value(credential)?);
        self.base.execute_with_progress("Storing credential", api.send_as(request)).await
    }

    /// # Errors
    ///
    /// Returns the API error, or `NotLoggedIn` without a session.
    pub async fn delete(&self, credential_id: &str) -> Result<()> {
        self.base.require_session()?;
        let path = CREDENTIAL_DETAIL.resolve(&[("credential_id", credential_id)])?;
        self.base.execute_with_progress("Deleting credential", self.base.api().delete(&path)).await?;
        Ok(())
    }
}
