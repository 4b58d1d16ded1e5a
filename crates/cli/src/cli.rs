//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Posture Monitor - live posture classification from device telemetry
#[derive(Parser, Debug)]
#[command(
    name = "posture-monitor",
    author,
    version,
    about = "Posture telemetry feature pipeline",
    long_about = "Turns accelerometer, gyroscope, gravity and rotation-vector telemetry into \n\
                  trained-model feature vectors, classifies them once per cycle and \n\
                  summarizes the session as time per posture."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "POSTURE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "POSTURE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a monitoring session
    Run(RunArgs),

    /// Validate a feature configuration without running
    Validate(ValidateArgs),

    /// Display feature configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Feature configuration (TOML or JSON)
    #[arg(short, long, default_value = "posture.toml", env = "POSTURE_CONFIG")]
    pub config: PathBuf,

    /// Linear classifier model (JSON)
    #[arg(short, long, default_value = "model.json", env = "POSTURE_MODEL")]
    pub model: PathBuf,

    /// Replay a JSONL telemetry recording
    #[arg(long, conflicts_with = "synthetic", env = "POSTURE_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = recorded pace)
    #[arg(long, default_value = "1.0", env = "POSTURE_REPLAY_SPEED")]
    pub replay_speed: f64,

    /// Generate synthetic telemetry for a posture preset
    #[arg(long, value_name = "POSTURE", env = "POSTURE_SYNTHETIC")]
    pub synthetic: Option<String>,

    /// Seed for the synthetic generator
    #[arg(long, env = "POSTURE_SEED")]
    pub seed: Option<u64>,

    /// Session length in seconds (0 = until Ctrl+C or the recording ends)
    #[arg(long, default_value = "0", env = "POSTURE_DURATION")]
    pub duration: u64,

    /// Processing cycle period in milliseconds
    #[arg(long, default_value = "1000", env = "POSTURE_PERIOD_MS")]
    pub period_ms: u64,

    /// Ingestion channel capacity
    #[arg(long, default_value = "1024", env = "POSTURE_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "POSTURE_METRICS_PORT")]
    pub metrics_port: u16,

    /// Print the session report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Feature configuration to validate
    #[arg(short, long, default_value = "posture.toml", env = "POSTURE_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Feature configuration
    #[arg(short, long, default_value = "posture.toml", env = "POSTURE_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List every feature the pipeline can emit
    #[arg(long)]
    pub features: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
