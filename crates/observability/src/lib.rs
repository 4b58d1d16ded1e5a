//! # Observability
//!
//! Tracing subscriber setup and Prometheus metrics for the posture pipeline.
//!
//! ## Features
//!
//! - Tracing init (JSON / Pretty / Compact, `RUST_LOG` aware)
//! - Optional Prometheus exporter
//! - Cycle outcome recording and in-memory summaries
//!
//! ## Example
//!
//! ```ignore
//! use observability::{init_with_config, record_cycle, CycleOutcome, ObservabilityConfig};
//!
//! init_with_config(ObservabilityConfig::default())?;
//! record_cycle(CycleOutcome::Predicted, 0.8);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

// Re-exports
pub use crate::metrics::{
    record_buffer_depth, record_cycle, record_prediction, record_prediction_dropped,
    record_sample_recorded, record_samples_dropped, CycleOutcome, CycleStatsAggregator,
    CycleSummary, RunningStats, StatsSummary,
};

/// Initialize tracing with defaults (JSON, `info`, no exporter)
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Filter used when `RUST_LOG` is unset
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: None,
            default_log_level: "info".to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON lines
    #[default]
    Json,
    /// Human-readable multi-line
    Pretty,
    /// Single-line
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Initialize with a custom configuration
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// Install only the Prometheus exporter on `0.0.0.0:<port>`
///
/// For binaries that set up their own tracing subscriber.
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("Failed to install Prometheus recorder on port {port}"))?;

    tracing::info!(port, "Prometheus metrics endpoint listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.default_log_level, "info");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("PRETTY".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert_eq!("compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
