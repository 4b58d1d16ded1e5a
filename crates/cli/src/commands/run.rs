//! `run` command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::FeatureConfig;
use decision::LinearSoftmaxClassifier;
use tracing::info;

use crate::cli::RunArgs;
use crate::session::{Session, SessionConfig, TelemetrySource};

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let feature_config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let classifier = LinearSoftmaxClassifier::load(&args.model)
        .with_context(|| format!("Failed to load model from {}", args.model.display()))?;
    check_model(&feature_config, &classifier)?;

    info!(
        labels = ?feature_config.class_labels,
        features = feature_config.feature_columns.len(),
        interval = feature_config.interval,
        window_size = feature_config.window_size,
        "Configuration loaded"
    );

    let source = telemetry_source(args)?;
    let session = Session::new(SessionConfig {
        feature_config: Arc::new(feature_config),
        classifier: Arc::new(classifier),
        source,
        duration: (args.duration > 0).then(|| Duration::from_secs(args.duration)),
        period: Duration::from_millis(args.period_ms.max(1)),
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting session...");
    let stats = session.run().await.context("Session execution failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialize session report")?;
        println!("{}", json);
    } else {
        stats.print_summary();
    }

    info!("Posture Monitor finished");
    Ok(())
}

fn telemetry_source(args: &RunArgs) -> Result<TelemetrySource> {
    match (&args.replay, &args.synthetic) {
        (Some(path), _) => {
            if !(args.replay_speed > 0.0) {
                anyhow::bail!("--replay-speed must be positive, got {}", args.replay_speed);
            }
            Ok(TelemetrySource::Replay {
                path: path.clone(),
                speed: args.replay_speed,
            })
        }
        (None, Some(posture)) => Ok(TelemetrySource::Synthetic {
            posture: posture.clone(),
            seed: args.seed,
        }),
        (None, None) => anyhow::bail!("No telemetry source: pass --replay <file> or --synthetic <posture>"),
    }
}

/// The model must score the configured vector and cover every label
fn check_model(config: &FeatureConfig, model: &LinearSoftmaxClassifier) -> Result<()> {
    if model.feature_count() != config.feature_columns.len() {
        anyhow::bail!(
            "Model expects {} features but the configuration produces {}",
            model.feature_count(),
            config.feature_columns.len()
        );
    }
    if let Some(missing) = config
        .class_labels
        .iter()
        .find(|label| !model.labels().contains(label))
    {
        anyhow::bail!("Model has no output for class label '{missing}'");
    }
    Ok(())
}
