//! # Posture Monitor CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Feature configuration loading and validation
//! - Session orchestration over synthetic or replayed telemetry
//! - Graceful shutdown and session reports

mod cli;
mod commands;
mod session;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_session, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Posture Monitor CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_session(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
///
/// `RUST_LOG` overrides the level implied by `-v` / `-q`.
fn init_logging(cli: &Cli) -> Result<()> {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
    })
}
