//! Bucketed series and rolling feature maps
//!
//! Intermediate products of the feature pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Integer bucket index: `round(t / interval)`
///
/// Cross-stream alignment compares keys, not float times, so two streams that
/// land in the same bucket always match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketKey(pub i64);

impl BucketKey {
    /// Quantize a relative timestamp (`f64::round` is half away from zero)
    #[inline]
    pub fn from_time(timestamp: f64, interval: f64) -> Self {
        Self((timestamp / interval).round() as i64)
    }

    /// Quantized bucket time: `round(t / interval) * interval`
    #[inline]
    pub fn time(self, interval: f64) -> f64 {
        self.0 as f64 * interval
    }
}

/// Feature name → value
pub type FeatureRow = HashMap<String, f64>;

/// One fixed-width time slice, averaged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Bucket identity
    pub key: BucketKey,

    /// Quantized bucket time (seconds)
    pub time: f64,

    /// Column values
    pub values: FeatureRow,
}

impl Bucket {
    pub fn new(key: BucketKey, interval: f64, values: FeatureRow) -> Self {
        Self {
            key,
            time: key.time(interval),
            values,
        }
    }

    /// Value of a column, treating NaN as absent
    #[inline]
    pub fn value(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied().filter(|v| !v.is_nan())
    }
}

/// Per-stream buckets, ascending by key, keys distinct
pub type BucketedSeries = Vec<Bucket>;

/// bucket → feature name → value, produced per feature group
pub type RollingFeatureMap = BTreeMap<BucketKey, FeatureRow>;

/// Final ordered feature vector for one processing cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Time of the synchronized bucket the vector describes
    pub bucket_time: f64,

    /// Values in `FeatureConfig::feature_columns` order
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
