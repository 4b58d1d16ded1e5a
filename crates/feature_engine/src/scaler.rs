//! Min-max normalization against the trained range table.

use std::collections::HashMap;

use contracts::{BucketedSeries, ColumnRange, FeatureConfig};

/// Scale one value into `[0, 1]`, clamping out-of-range input first
///
/// A zero-span range maps every value to 0.
#[inline]
pub fn scale_value(value: f64, range: &ColumnRange) -> f64 {
    if range.is_degenerate() {
        return 0.0;
    }
    let clamped = value.max(range.min).min(range.max);
    (clamped - range.min) / (range.max - range.min)
}

/// Range lookup keyed by `"<streamKey>.<column>"`
#[derive(Debug, Clone, Default)]
pub struct Scaler {
    ranges: HashMap<String, ColumnRange>,
}

impl Scaler {
    pub fn new(ranges: HashMap<String, ColumnRange>) -> Self {
        Self { ranges }
    }

    pub fn from_config(config: &FeatureConfig) -> Self {
        Self::new(config.ranges.clone())
    }

    /// Scale a column value; columns without a range pass through
    pub fn scale(&self, stream_key: &str, column: &str, value: f64) -> f64 {
        match self.ranges.get(&format!("{stream_key}.{column}")) {
            Some(range) => scale_value(value, range),
            None => value,
        }
    }

    /// Scale every column of every bucket in place
    pub fn scale_series(&self, stream_key: &str, series: &mut BucketedSeries) {
        for bucket in series.iter_mut() {
            for (column, value) in bucket.values.iter_mut() {
                *value = self.scale(stream_key, column, *value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Bucket, BucketKey};

    fn scaler() -> Scaler {
        Scaler::new(HashMap::from([
            ("accelerometer.x".to_string(), ColumnRange::new(-10.0, 10.0)),
            ("orientation.yaw".to_string(), ColumnRange::new(0.0, 360.0)),
            ("gravity.z".to_string(), ColumnRange::new(9.8, 9.8)),
        ]))
    }

    #[test]
    fn test_scale_in_range() {
        assert_eq!(scaler().scale("accelerometer", "x", 0.0), 0.5);
        assert_eq!(scaler().scale("orientation", "yaw", 90.0), 0.25);
    }

    #[test]
    fn test_out_of_range_clamps() {
        assert_eq!(scaler().scale("accelerometer", "x", 25.0), 1.0);
        assert_eq!(scaler().scale("accelerometer", "x", -25.0), 0.0);
    }

    #[test]
    fn test_degenerate_range_is_zero() {
        assert_eq!(scaler().scale("gravity", "z", 12.0), 0.0);
    }

    #[test]
    fn test_missing_range_passes_through() {
        assert_eq!(scaler().scale("gyroscope", "x", 3.7), 3.7);
        // Same column under another stream key has no range
        assert_eq!(scaler().scale("gravity", "x", -3.7), -3.7);
    }

    #[test]
    fn test_scale_series_in_place() {
        let mut series = vec![Bucket::new(
            BucketKey(0),
            0.5,
            [("x".to_string(), 5.0), ("y".to_string(), 42.0)].into(),
        )];
        scaler().scale_series("accelerometer", &mut series);

        assert_eq!(series[0].value("x"), Some(0.75));
        assert_eq!(series[0].value("y"), Some(42.0));
    }
}
