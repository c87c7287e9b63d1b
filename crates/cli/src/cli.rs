//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use agentcore_domain::{CloudProvider, ModelStage};
use agentcore_infra::config::CONFIG_DIR_ENV;

use crate::output::Format;

/// Environment variable read for the login password
pub const PASSWORD_ENV: &str = "AGENTCORE_PASSWORD";

/// AgentCore CLI - drive the MLOps backend from a terminal.
#[derive(Parser, Debug, Clone)]
#[command(name = "agentcore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding config.json.
    #[arg(long, global = true, env = CONFIG_DIR_ENV)]
    pub config_dir: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Show response bodies and endpoints when a request fails.
    #[arg(long, global = true)]
    pub details: bool,

    /// Skip TLS certificate verification.
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Point the CLI at a backend.
    Configure {
        /// Base URL of the backend, e.g. https://mlops.example.com
        #[arg(long)]
        url: String,
    },

    /// Sign in and store a session.
    Login(LoginArgs),

    /// Forget the stored session.
    Logout,

    /// Show the logged-in user's profile.
    Whoami,

    /// Show the configured server and session.
    Status,

    /// Project management commands.
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Data source commands.
    DataSource {
        #[command(subcommand)]
        command: DataSourceCommands,
    },

    /// Data version commands.
    DataVersion {
        #[command(subcommand)]
        command: DataVersionCommands,
    },

    /// Experiment commands.
    Experiment {
        #[command(subcommand)]
        command: ExperimentCommands,
    },

    /// Deployment commands.
    Deploy {
        #[command(subcommand)]
        command: DeployCommands,
    },

    /// Cloud credential commands.
    Credential {
        #[command(subcommand)]
        command: CredentialCommands,
    },
}

/// Arguments for `login`.
#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    /// Account email; defaults to the last one used.
    #[arg(short, long)]
    pub email: Option<String>,

    /// Account password.
    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: String,
}

/// Project subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ProjectCommands {
    /// List projects.
    List,
    /// Show one project.
    Get { id: String },
    /// Create a project.
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a project.
    Delete { id: String },
}

/// Data source subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum DataSourceCommands {
    /// List data sources.
    List {
        #[arg(long)]
        project: Option<String>,
    },
    /// Register a data source.
    Create {
        name: String,
        /// Source kind, e.g. s3, gcs, postgres.
        #[arg(long = "type")]
        source_type: String,
        #[arg(long)]
        uri: String,
        #[arg(long)]
        project: Option<String>,
    },
}

/// Data version subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum DataVersionCommands {
    /// List data versions.
    List {
        #[arg(long)]
        source: Option<String>,
    },
    /// Show one data version.
    Get { id: String },
    /// Snapshot a data source as a new version.
    Create {
        #[arg(long)]
        source: String,
        #[arg(long)]
        tag: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Show sample rows.
    Preview {
        id: String,
        /// Columns to include; repeat or comma-separate.
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show the version's change history.
    History { id: String },
}

/// Experiment subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ExperimentCommands {
    /// List experiments.
    List {
        #[arg(long)]
        project: Option<String>,
    },
    /// Show one experiment.
    Get { id: String },
    /// Start a training run.
    Run {
        #[arg(long)]
        project: String,
        #[arg(long)]
        data_version: String,
        #[arg(long)]
        name: Option<String>,
        /// Run parameter as key=value; values are parsed as JSON when possible.
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Promote an experiment's model.
    Promote {
        id: String,
        #[arg(long)]
        stage: ModelStage,
    },
}

/// Deployment subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum DeployCommands {
    /// List deployments.
    List,
    /// Deploy an experiment's model.
    Create {
        name: String,
        #[arg(long)]
        experiment: String,
        #[arg(long)]
        target: String,
        #[arg(long, default_value_t = 1)]
        replicas: u32,
    },
    /// Tear down a deployment.
    Delete { id: String },
}

/// Credential subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum CredentialCommands {
    /// List stored credentials.
    List,
    /// Store a credential.
    Create {
        name: String,
        #[arg(long)]
        provider: CloudProvider,
        /// Secret field as key=value; repeat for each field.
        #[arg(long = "secret", value_parser = parse_key_value, required = true)]
        secrets: Vec<(String, String)>,
    },
    /// Delete a credential.
    Delete { id: String },
}

/// Parse `key=value`
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}
