//! Resource managers
//!
//! One manager per backend resource family. Each is a thin list of
//! `{endpoint, verb, payload}` calls over [`BaseManager`].

pub mod auth;
pub mod base;
pub mod credential;
pub mod data_version;
pub mod deploy;
pub mod experiment;
pub mod project;

pub use auth::{AuthManager, SessionStatus};
pub use base::{BaseManager, ResourceManager};
pub use credential::CredentialManager;
pub use data_version::DataVersionManager;
pub use deploy::DeployManager;
pub use experiment::ExperimentManager;
pub use project::ProjectManager;
