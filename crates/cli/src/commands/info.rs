//! `info` command implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use contracts::{ColumnRange, FeatureConfig, StreamKind};
use feature_engine::FeaturePipeline;
use serde::Serialize;
use tracing::info;

use super::validate::projection_name;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    interval: f64,
    trim_seconds: f64,
    window_size: usize,
    retention_seconds: f64,
    max_samples_per_stream: usize,
    class_labels: Vec<String>,
    groups: GroupInfo,
    projection: String,
    streams: Vec<StreamInfo>,
    ranges: BTreeMap<String, ColumnRange>,
    feature_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available_features: Option<Vec<String>>,
}

#[derive(Serialize)]
struct GroupInfo {
    motion: String,
    orientation: String,
    orientation_features: Vec<String>,
}

#[derive(Serialize)]
struct StreamInfo {
    stream: String,
    columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    magnitude: Option<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let pipeline = FeaturePipeline::new(Arc::new(config)).context("Failed to build feature pipeline")?;

    let info = build_config_info(&pipeline, args.features);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(pipeline: &FeaturePipeline, with_features: bool) -> ConfigInfo {
    let config: &FeatureConfig = pipeline.config();

    let streams = StreamKind::MOTION
        .into_iter()
        .map(|kind| {
            let spec = config.stream_spec(kind);
            StreamInfo {
                stream: kind.key().to_string(),
                columns: spec.columns,
                magnitude: spec.magnitude.map(|m| format!("{} = |{}|", m.name, m.axes.join(", "))),
            }
        })
        .collect();

    ConfigInfo {
        interval: config.interval,
        trim_seconds: config.trim_seconds,
        window_size: config.window_size,
        retention_seconds: config.retention_seconds,
        max_samples_per_stream: config.max_samples_per_stream,
        class_labels: config.class_labels.clone(),
        groups: GroupInfo {
            motion: config.motion_group.clone(),
            orientation: config.orientation_group.clone(),
            orientation_features: pipeline.orientation_columns().to_vec(),
        },
        projection: projection_name(config),
        streams,
        ranges: config.ranges.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        feature_columns: config.feature_columns.clone(),
        available_features: with_features.then(|| pipeline.available_features()),
    }
}

fn tree_prefix(index: usize, len: usize) -> &'static str {
    if index + 1 == len { "└─" } else { "├─" }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Posture Monitor Configuration                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⏱  Bucketing");
    println!("   ├─ Interval: {}s", info.interval);
    println!("   ├─ Trim: {}s", info.trim_seconds);
    println!("   ├─ Window: {} buckets", info.window_size);
    println!(
        "   └─ Retention: {}s (max {} samples/stream)",
        info.retention_seconds, info.max_samples_per_stream
    );

    println!("\n🏷  Classes ({})", info.class_labels.len());
    for (i, label) in info.class_labels.iter().enumerate() {
        println!("   {} {}", tree_prefix(i, info.class_labels.len()), label);
    }

    println!("\n📡 Motion Streams ({})", info.projection);
    for (i, stream) in info.streams.iter().enumerate() {
        let magnitude = stream
            .magnitude
            .as_deref()
            .map(|m| format!(", {}", m))
            .unwrap_or_default();
        println!(
            "   {} {}: [{}]{}",
            tree_prefix(i, info.streams.len()),
            stream.stream,
            stream.columns.join(", "),
            magnitude
        );
    }

    println!("\n🧭 Groups");
    println!("   ├─ Motion: {}", info.groups.motion);
    println!(
        "   └─ Orientation: {} [{}]",
        info.groups.orientation,
        info.groups.orientation_features.join(", ")
    );

    println!("\n📏 Ranges ({})", info.ranges.len());
    for (i, (key, range)) in info.ranges.iter().enumerate() {
        println!(
            "   {} {}: [{}, {}]",
            tree_prefix(i, info.ranges.len()),
            key,
            range.min,
            range.max
        );
    }

    println!("\n🔢 Feature Vector ({})", info.feature_columns.len());
    for (i, column) in info.feature_columns.iter().enumerate() {
        println!("   {} [{}] {}", tree_prefix(i, info.feature_columns.len()), i, column);
    }

    if let Some(ref available) = info.available_features {
        println!("\n📋 Available Features ({})", available.len());
        for (i, feature) in available.iter().enumerate() {
            let marker = if info.feature_columns.contains(feature) { "✓" } else { " " };
            println!("   {} {} {}", tree_prefix(i, available.len()), marker, feature);
        }
    }

    println!();
}
