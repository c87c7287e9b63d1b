//! Configuration persistence
//!
//! The config directory is resolved once by [`paths::resolve_config_dir`];
//! [`ConfigStore`] then owns `config.json` inside it.

pub mod paths;
pub mod store;

// Re-export commonly used items
pub use paths::{resolve_config_dir, CONFIG_DIR_ENV, DEFAULT_DIR_NAME};
pub use store::{ConfigStore, CONFIG_FILE_NAME, KEY_BASE_URL, KEY_LOGIN_EMAIL};
