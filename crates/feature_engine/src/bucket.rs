//! Fixed-width time bucketing.
//!
//! trim → group by `round(t / interval)` → average base columns → derive magnitude.

use std::collections::{BTreeMap, HashMap};

use contracts::{Bucket, BucketKey, BucketedSeries, SensorSample, StreamSpec};

/// Running sum for one column inside one bucket
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Groups one stream's samples into averaged buckets
#[derive(Debug, Clone, Copy)]
pub struct BucketAggregator {
    interval: f64,
    trim_seconds: f64,
}

impl BucketAggregator {
    pub fn new(interval: f64, trim_seconds: f64) -> Self {
        Self {
            interval,
            trim_seconds,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Aggregate time-ascending samples into buckets
    ///
    /// A bucket missing any base column of `spec` is dropped. Output is
    /// sorted ascending by key.
    pub fn aggregate(&self, samples: &[SensorSample], spec: &StreamSpec) -> BucketedSeries {
        let Some(first) = samples.first() else {
            return Vec::new();
        };
        let trim_until = first.timestamp + self.trim_seconds;

        let mut grouped: BTreeMap<BucketKey, Vec<Accumulator>> = BTreeMap::new();
        for sample in samples.iter().filter(|s| s.timestamp >= trim_until) {
            let key = BucketKey::from_time(sample.timestamp, self.interval);
            let slots = grouped
                .entry(key)
                .or_insert_with(|| vec![Accumulator::default(); spec.columns.len()]);
            for (slot, column) in slots.iter_mut().zip(&spec.columns) {
                if let Some(value) = sample.value(column) {
                    slot.sum += value;
                    slot.count += 1;
                }
            }
        }

        grouped
            .into_iter()
            .filter_map(|(key, slots)| {
                let mut values = HashMap::with_capacity(spec.columns.len() + 1);
                for (slot, column) in slots.iter().zip(&spec.columns) {
                    values.insert(column.clone(), slot.mean()?);
                }
                if let Some(magnitude) = &spec.magnitude {
                    let squares: Option<Vec<f64>> = magnitude
                        .axes
                        .iter()
                        .map(|axis| values.get(axis).map(|v| v * v))
                        .collect();
                    if let Some(squares) = squares {
                        values.insert(magnitude.name.clone(), squares.iter().sum::<f64>().sqrt());
                    }
                }
                Some(Bucket::new(key, self.interval, values))
            })
            .collect()
    }
}
