//! Cross-group alignment and final vector assembly.

use std::collections::BTreeSet;

use contracts::{BucketKey, FeatureRow, FeatureVector, RollingFeatureMap};
use tracing::trace;

/// Aligns rolling feature groups and builds the ordered feature vector
#[derive(Debug, Clone)]
pub struct StreamSynchronizer {
    feature_columns: Vec<String>,
    interval: f64,
}

impl StreamSynchronizer {
    pub fn new(feature_columns: Vec<String>, interval: f64) -> Self {
        Self {
            feature_columns,
            interval,
        }
    }

    /// Bucket keys shared by every non-empty group, ascending
    pub fn common_keys(groups: &[&RollingFeatureMap]) -> BTreeSet<BucketKey> {
        let mut non_empty = groups.iter().filter(|g| !g.is_empty());
        let Some(first) = non_empty.next() else {
            return BTreeSet::new();
        };
        let mut keys: BTreeSet<BucketKey> = first.keys().copied().collect();
        for group in non_empty {
            keys.retain(|key| group.contains_key(key));
        }
        keys
    }

    /// Vector at the most recent common bucket
    ///
    /// `None` when the groups share no bucket or any configured feature is
    /// absent from the merged row. Never partial.
    pub fn synchronize(&self, groups: &[&RollingFeatureMap]) -> Option<FeatureVector> {
        let key = Self::common_keys(groups).pop_last()?;

        let mut merged = FeatureRow::new();
        for group in groups {
            if let Some(row) = group.get(&key) {
                merged.extend(row.iter().map(|(k, v)| (k.clone(), *v)));
            }
        }

        let values = self
            .feature_columns
            .iter()
            .map(|name| {
                let value = merged.get(name).copied();
                if value.is_none() {
                    trace!(feature = %name, bucket = key.0, "feature absent at common bucket");
                }
                value
            })
            .collect::<Option<Vec<f64>>>()?;

        Some(FeatureVector {
            bucket_time: key.time(self.interval),
            values,
        })
    }
}
