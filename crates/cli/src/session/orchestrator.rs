//! Session orchestrator - wires ingestion, the monitor and the report.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{Classifier, FeatureConfig, SensorSource, SystemClock};
use ingestion::{
    IngestionPipeline, JsonlReplaySource, ReplayConfig, SyntheticConfig, SyntheticPostureSource,
};
use monitor::{MonitorSettings, PostureMonitor};
use tracing::{debug, info, warn};

use super::SessionStats;

/// Where telemetry comes from
#[derive(Debug, Clone)]
pub enum TelemetrySource {
    /// Generated readings for a posture preset
    Synthetic { posture: String, seed: Option<u64> },
    /// A JSONL recording
    Replay { path: PathBuf, speed: f64 },
}

impl TelemetrySource {
    fn describe(&self) -> String {
        match self {
            TelemetrySource::Synthetic { posture, .. } => format!("synthetic ({posture})"),
            TelemetrySource::Replay { path, speed } => format!("replay {} (x{speed})", path.display()),
        }
    }
}

/// Session configuration
#[derive(Clone)]
pub struct SessionConfig {
    pub feature_config: Arc<FeatureConfig>,
    pub classifier: Arc<dyn Classifier>,
    pub source: TelemetrySource,
    /// Session length (None = until the source ends or Ctrl+C)
    pub duration: Option<Duration>,
    pub period: Duration,
    /// Ingestion channel capacity
    pub buffer_size: usize,
    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Runs one monitoring session to completion
pub struct Session {
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run until the duration elapses, the recording ends or a shutdown
    /// signal arrives
    pub async fn run(self) -> Result<SessionStats> {
        let start_time = Instant::now();

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Source
        let (source, source_span) = self.build_source()?;
        let duration = self.config.duration.or(source_span);
        info!(
            source = %self.config.source.describe(),
            kinds = ?source.kinds(),
            duration_secs = duration.map(|d| d.as_secs_f64()),
            "Telemetry source ready"
        );

        // Ingestion
        let mut ingestion = IngestionPipeline::new(self.config.buffer_size);
        ingestion
            .register_source(source.source_id().to_string(), source, None)
            .context("Failed to register telemetry source")?;
        let ingestion_rx = ingestion
            .take_receiver()
            .context("Failed to get ingestion receiver")?;

        // Monitor
        let settings = MonitorSettings {
            period: self.config.period,
            ..MonitorSettings::default()
        };
        let monitor = PostureMonitor::new(
            self.config.feature_config.clone(),
            self.config.classifier.clone(),
            Arc::new(SystemClock::new()),
            settings,
        )
        .context("Failed to build posture monitor")?;

        let mut predictions = monitor.start().context("Failed to start session")?;
        let forwarding = monitor.attach(ingestion_rx);
        ingestion.start_all();

        info!(
            period_ms = self.config.period.as_millis() as u64,
            features = self.config.feature_config.feature_columns.len(),
            "Session running"
        );

        let mut stats = SessionStats {
            source: self.config.source.describe(),
            ..Default::default()
        };

        let deadline = async {
            match duration {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                prediction = predictions.recv() => match prediction {
                    Some(prediction) => {
                        stats.predictions_received += 1;
                        info!(
                            label = %prediction.label,
                            confidence = f64::from(prediction.confidence),
                            "Posture"
                        );
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    info!("Session duration reached");
                    break;
                }
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping session...");
                    break;
                }
            }
        }

        // Shutdown
        info!("Stopping session...");
        stats.buffer = monitor.buffer_stats();
        stats.result = monitor.stop().context("Failed to stop session")?;
        ingestion.stop_all();
        stats.events_stored = match forwarding.await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Ingestion forwarding task failed");
                0
            }
        };
        stats.ingestion = ingestion.metrics().snapshot();
        stats.cycles = monitor.cycle_summary();
        stats.duration = start_time.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            predictions = stats.predictions_received,
            "Session shutdown complete"
        );

        Ok(stats)
    }

    /// Source plus, for recordings, how long playback takes
    fn build_source(&self) -> Result<(Box<dyn SensorSource>, Option<Duration>)> {
        match &self.config.source {
            TelemetrySource::Synthetic { posture, seed } => {
                let mut config = SyntheticConfig::for_posture(posture).with_context(|| {
                    format!(
                        "Unknown posture preset '{posture}' (expected one of {:?})",
                        ingestion::POSTURE_PRESETS
                    )
                })?;
                config.seed = *seed;
                Ok((Box::new(SyntheticPostureSource::new("synthetic", config)), None))
            }
            TelemetrySource::Replay { path, speed } => {
                let replay = ReplayConfig {
                    speed_multiplier: *speed,
                    ..ReplayConfig::default()
                };
                let source = JsonlReplaySource::load(path, "replay", replay)
                    .with_context(|| format!("Failed to load recording {}", path.display()))?;
                // One extra period lets the last buckets be classified
                let playback = source.span().div_f64(speed.max(0.1)) + self.config.period;
                debug!(
                    events = source.events().len(),
                    playback_secs = playback.as_secs_f64(),
                    "Recording loaded"
                );
                Ok((Box::new(source), Some(playback)))
            }
        }
    }
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
