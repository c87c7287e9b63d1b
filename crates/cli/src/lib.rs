//! # AgentCore CLI
//!
//! Terminal front end for the AgentCore MLOps backend.
//!
//! ## Modules
//! - [`cli`]: clap argument definitions
//! - [`commands`]: dispatch from parsed arguments to managers
//! - [`managers`]: one manager per backend resource family
//! - [`error_handler`]: uniform rendering of failures
//! - [`progress`]: spinner shown while a request is in flight
//! - [`output`]: table and JSON rendering
//! - [`console`]: the terminal writer shared by all of the above

pub mod cli;
pub mod commands;
pub mod console;
pub mod error_handler;
pub mod managers;
pub mod output;
pub mod progress;

// Re-export commonly used items
pub use cli::{Cli, Commands};
pub use commands::{run, CommandContext};
pub use console::Console;
pub use error_handler::{handle_api_error, ErrorOptions, Handled, Reported};
pub use output::{Format, OutputFormat};
pub use progress::{ProgressReporter, ProgressTask};
