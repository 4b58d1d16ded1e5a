//! `validate` command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use contracts::{FeatureConfig, StreamKind, ORIENTATION_STREAM_KEY};
use feature_engine::FeaturePipeline;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    interval: f64,
    window_size: usize,
    class_count: usize,
    feature_count: usize,
    projection: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();
    let invalid = |error: String| ValidationResult {
        valid: false,
        config_path: config_path.clone(),
        error: Some(error),
        warnings: None,
        summary: None,
    };

    if !args.config.exists() {
        return invalid(format!("File not found: {}", args.config.display()));
    }

    let config = match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => config,
        Err(e) => return invalid(e.to_string()),
    };

    let config = Arc::new(config);
    let pipeline = match FeaturePipeline::new(Arc::clone(&config)) {
        Ok(pipeline) => pipeline,
        Err(e) => return invalid(e.to_string()),
    };

    let warnings = collect_warnings(&config, &pipeline);
    ValidationResult {
        valid: true,
        config_path: config_path.clone(),
        error: None,
        warnings: (!warnings.is_empty()).then_some(warnings),
        summary: Some(ConfigSummary {
            interval: config.interval,
            window_size: config.window_size,
            class_count: config.class_labels.len(),
            feature_count: config.feature_columns.len(),
            projection: projection_name(&config),
        }),
    }
}

pub(crate) fn projection_name(config: &FeatureConfig) -> String {
    match &config.pca {
        Some(pca) => format!("pca ({} components)", pca.component_count),
        None => "raw".to_string(),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &FeatureConfig, pipeline: &FeaturePipeline) -> Vec<String> {
    let mut warnings = Vec::new();

    // Features the pipeline can never produce leave every cycle without a vector
    let available = pipeline.available_features();
    for column in &config.feature_columns {
        if !available.contains(column) {
            warnings.push(format!(
                "Feature column '{}' is not produced by the pipeline - no vector will ever be built",
                column
            ));
        }
    }

    for column in pipeline.orientation_columns() {
        if config.range_for(ORIENTATION_STREAM_KEY, column).is_none() {
            warnings.push(format!(
                "No range for '{ORIENTATION_STREAM_KEY}.{column}' - values pass through unscaled"
            ));
        }
    }

    if config.pca.is_none() {
        warnings.push("No PCA bundle - motion branch forwards raw joined columns".to_string());
    }

    for kind in StreamKind::MOTION {
        let unscaled: Vec<String> = config
            .stream_spec(kind)
            .columns
            .into_iter()
            .filter(|c| config.range_for(kind.key(), c).is_none())
            .collect();
        if !unscaled.is_empty() {
            warnings.push(format!(
                "No range for {} columns {:?} - values pass through unscaled",
                kind.key(),
                unscaled
            ));
        }
    }

    if config.trim_seconds >= config.retention_seconds {
        warnings.push(format!(
            "trim_seconds ({}) >= retention_seconds ({}) - trimming may discard every sample",
            config.trim_seconds, config.retention_seconds
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Interval: {}s", summary.interval);
            println!("  Window: {} buckets", summary.window_size);
            println!("  Classes: {}", summary.class_count);
            println!("  Features: {}", summary.feature_count);
            println!("  Projection: {}", summary.projection);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
