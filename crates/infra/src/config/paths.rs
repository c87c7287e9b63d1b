//! Config directory resolution
//!
//! ## Lookup order
//! 1. An explicit directory (CLI `--config-dir`)
//! 2. `AGENTCORE_CONFIG_DIR`
//! 3. `~/.agentcore`

use std::path::PathBuf;

use agentcore_domain::ConfigurationError;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "AGENTCORE_CONFIG_DIR";

/// Directory name under the user's home
pub const DEFAULT_DIR_NAME: &str = ".agentcore";

/// Resolve the directory holding `config.json`
///
/// # Errors
/// Returns `ConfigurationError::NoConfigDir` if nothing is given and the home
/// directory cannot be determined.
pub fn resolve_config_dir(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigurationError> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }

    if let Some(dir) = env_dir() {
        tracing::debug!(dir = %dir.display(), "Using config directory from {}", CONFIG_DIR_ENV);
        return Ok(dir);
    }

    dirs::home_dir().map(|home| home.join(DEFAULT_DIR_NAME)).ok_or_else(|| {
        ConfigurationError::NoConfigDir(format!(
            "home directory not found; set {CONFIG_DIR_ENV} or pass --config-dir"
        ))
    })
}

fn env_dir() -> Option<PathBuf> {
    std::env::var_os(CONFIG_DIR_ENV).filter(|value| !value.is_empty()).map(PathBuf::from)
}
