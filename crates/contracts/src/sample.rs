//! SensorSample / SensorEvent - Ingestion types
//!
//! Raw readings as delivered by a sensor source, and as stored once the
//! session time origin has been applied.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Column name → value for one reading (`x`, `y`, `z`, `w`, `yaw`, ...)
pub type SampleValues = HashMap<String, f64>;

/// Physical sensor kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Accelerometer,
    Gyroscope,
    Gravity,
    RotationVector,
}

impl StreamKind {
    /// Every stream kind, in canonical order
    pub const ALL: [StreamKind; 4] = [
        StreamKind::Accelerometer,
        StreamKind::Gyroscope,
        StreamKind::Gravity,
        StreamKind::RotationVector,
    ];

    /// The streams feeding the motion (PCA) branch, in projector order
    pub const MOTION: [StreamKind; 3] = [
        StreamKind::Accelerometer,
        StreamKind::Gyroscope,
        StreamKind::Gravity,
    ];

    /// Stable stream key used in range lookups and config files
    pub fn key(&self) -> &'static str {
        match self {
            StreamKind::Accelerometer => "accelerometer",
            StreamKind::Gyroscope => "gyroscope",
            StreamKind::Gravity => "gravity",
            StreamKind::RotationVector => "rotation_vector",
        }
    }

    /// Parse a stream key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Whether the stream belongs to the motion branch
    pub fn is_motion(&self) -> bool {
        !matches!(self, StreamKind::RotationVector)
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for StreamKind {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| ContractError::Other(format!("unknown stream kind: {s}")))
    }
}

/// One stored reading, relative to the session time origin
///
/// Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Seconds since the session's first sample
    pub timestamp: f64,

    /// Column values
    pub values: SampleValues,
}

impl SensorSample {
    pub fn new(timestamp: f64, values: SampleValues) -> Self {
        Self { timestamp, values }
    }

    /// Value of a column, treating NaN as absent
    #[inline]
    pub fn value(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied().filter(|v| !v.is_nan())
    }
}

/// One reading as delivered by a sensor source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    /// Sensor kind
    pub kind: StreamKind,

    /// Monotonic sensor timestamp (nanoseconds)
    pub timestamp_ns: i64,

    /// Axis values
    pub values: SampleValues,
}

impl SensorEvent {
    pub fn new(kind: StreamKind, timestamp_ns: i64, values: SampleValues) -> Self {
        Self {
            kind,
            timestamp_ns,
            values,
        }
    }

    /// Build an event from `(column, value)` pairs
    pub fn from_axes<'a>(
        kind: StreamKind,
        timestamp_ns: i64,
        axes: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Self {
        let values = axes
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        Self::new(kind, timestamp_ns, values)
    }
}
