//! AgentCore CLI binary entrypoint.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use agentcore_cli::{run, Cli, Console};
use agentcore_infra::ReqwestTransport;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let transport =
        ReqwestTransport::builder().timeout(Duration::from_secs(cli.timeout)).build();
    let transport = match transport {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Failures are already rendered on the console
    match runtime.block_on(run(cli, Console::stdout(), Arc::new(transport))) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
