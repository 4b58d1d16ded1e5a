//! Feature configuration contract shared across crates.
//!
//! The bundle is produced by the offline training pipeline, loaded once at
//! startup and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::StreamKind;

/// Stream key under which resolved orientation columns are scaled
pub const ORIENTATION_STREAM_KEY: &str = "orientation";

/// Columns produced by the orientation resolver, in output order
pub const ORIENTATION_COLUMNS: [&str; 3] = ["yaw", "pitch", "roll"];

/// Label emitted when the classifier is not confident enough
pub const UNCLASSIFIED_LABEL: &str = "unclassified";

/// Label shown before the first prediction of a session
pub const COLLECTING_LABEL: &str = "collecting";

/// Feature engineering configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeatureConfig {
    /// Min-max ranges keyed by `"<streamKey>.<column>"`
    pub ranges: HashMap<String, ColumnRange>,

    /// Bucket width (seconds)
    #[validate(range(exclusive_min = 0.0, message = "interval must be > 0"))]
    pub interval: f64,

    /// Startup transient discarded from the head of every stream (seconds)
    #[validate(range(min = 0.0, message = "trim_seconds must be >= 0"))]
    pub trim_seconds: f64,

    /// Rolling window length (buckets)
    #[validate(range(min = 1, message = "window_size must be >= 1"))]
    pub window_size: usize,

    /// Ordered classifier labels
    #[validate(length(min = 1, message = "class_labels cannot be empty"))]
    pub class_labels: Vec<String>,

    /// Exact output vector order
    #[validate(length(min = 1, message = "feature_columns cannot be empty"))]
    pub feature_columns: Vec<String>,

    /// Subset of orientation columns fed to rolling stats (all when unset)
    #[serde(default)]
    pub orientation_features: Option<Vec<String>>,

    /// PCA bundle for the motion branch
    #[serde(default)]
    pub pca: Option<PcaBundle>,

    /// Per-stream column layout (motion streams)
    #[serde(default)]
    pub streams: HashMap<StreamKind, StreamSpec>,

    /// Rolling group name of the motion branch
    #[serde(default = "default_motion_group")]
    pub motion_group: String,

    /// Rolling group name of the orientation branch
    #[serde(default = "default_orientation_group")]
    pub orientation_group: String,

    /// Sample retention behind each stream's latest sample (seconds)
    #[serde(default = "default_retention_seconds")]
    #[validate(range(exclusive_min = 0.0, message = "retention_seconds must be > 0"))]
    pub retention_seconds: f64,

    /// Hard capacity of each stream's ring buffer
    #[serde(default = "default_max_samples")]
    #[validate(range(min = 1, message = "max_samples_per_stream must be >= 1"))]
    pub max_samples_per_stream: usize,
}

fn default_motion_group() -> String {
    "motion".to_string()
}

fn default_orientation_group() -> String {
    "orientation".to_string()
}

fn default_retention_seconds() -> f64 {
    60.0
}

fn default_max_samples() -> usize {
    4096
}

impl FeatureConfig {
    /// Range configured for a stream column, if any
    pub fn range_for(&self, stream_key: &str, column: &str) -> Option<&ColumnRange> {
        self.ranges.get(&format!("{stream_key}.{column}"))
    }

    /// Column layout of a motion stream (configured or default)
    pub fn stream_spec(&self, kind: StreamKind) -> StreamSpec {
        self.streams
            .get(&kind)
            .cloned()
            .unwrap_or_else(StreamSpec::motion_default)
    }

    /// Orientation columns kept for rolling statistics
    pub fn orientation_columns(&self) -> Vec<String> {
        match &self.orientation_features {
            Some(columns) => columns.clone(),
            None => ORIENTATION_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Pre-trained min/max for one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub min: f64,
    pub max: f64,
}

impl ColumnRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Zero-span range (scales every value to 0)
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }
}

/// Column layout of one motion stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSpec {
    /// Base columns every bucket must carry
    #[serde(default = "default_axes")]
    pub columns: Vec<String>,

    /// Optional derived Euclidean norm
    #[serde(default)]
    pub magnitude: Option<MagnitudeSpec>,
}

impl StreamSpec {
    /// `x`, `y`, `z` plus a `magnitude` column over all three axes
    pub fn motion_default() -> Self {
        Self {
            columns: default_axes(),
            magnitude: Some(MagnitudeSpec::default()),
        }
    }

    /// Plain base columns, no derivation
    pub fn plain(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            magnitude: None,
        }
    }
}

/// Derived magnitude column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeSpec {
    /// Output column name
    #[serde(default = "default_magnitude_name")]
    pub name: String,

    /// Axis columns included in the norm
    #[serde(default = "default_axes")]
    pub axes: Vec<String>,
}

impl Default for MagnitudeSpec {
    fn default() -> Self {
        Self {
            name: default_magnitude_name(),
            axes: default_axes(),
        }
    }
}

fn default_axes() -> Vec<String> {
    vec!["x".to_string(), "y".to_string(), "z".to_string()]
}

fn default_magnitude_name() -> String {
    "magnitude".to_string()
}

/// Training-time PCA fit for the motion branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaBundle {
    /// Ordered raw inputs, each `"<streamKey>.<column>"`
    pub input_columns: Vec<String>,

    /// `component_count × input_columns.len()`
    pub component_matrix: Vec<Vec<f64>>,

    /// Per-input mean subtracted before projection
    pub mean_vector: Vec<f64>,

    /// Output names are `"<output_prefix>_pc<k>"`
    pub output_prefix: String,

    /// Number of components kept
    pub component_count: usize,
}

impl PcaBundle {
    /// Name of the k-th component (zero-based index)
    pub fn component_name(&self, index: usize) -> String {
        format!("{}_pc{}", self.output_prefix, index + 1)
    }
}

/// Reference to a stream column, written `"<streamKey>.<column>"`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub stream: StreamKind,
    pub column: String,
}

impl ColumnRef {
    /// Parse `"accelerometer.x"`; `None` for an unknown stream or missing dot
    pub fn parse(spec: &str) -> Option<Self> {
        let (stream, column) = spec.split_once('.')?;
        if column.is_empty() {
            return None;
        }
        Some(Self {
            stream: StreamKind::from_key(stream)?,
            column: column.to_string(),
        })
    }
}
