//! Sliding-window mean/std per feature group.

use contracts::{Bucket, FeatureRow, RollingFeatureMap};

/// Population mean and standard deviation
///
/// `None` for an empty slice. A constant slice has exactly zero deviation.
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    // Summation error would otherwise leave a tiny non-zero std
    if values.iter().all(|v| *v == first) {
        return Some((first, 0.0));
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

/// Computes `<group>_<column>_mean` / `<group>_<column>_std`
#[derive(Debug, Clone, Copy)]
pub struct RollingStatsComputer {
    window_size: usize,
}

impl RollingStatsComputer {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Roll over consecutive buckets of one group
    ///
    /// Each window is keyed by its ending bucket. A window with any missing
    /// or NaN value for any column produces no row.
    pub fn compute(&self, group: &str, series: &[Bucket], columns: &[String]) -> RollingFeatureMap {
        let mut out = RollingFeatureMap::new();
        if series.len() < self.window_size {
            return out;
        }

        let mut scratch = Vec::with_capacity(self.window_size);
        for window in series.windows(self.window_size) {
            let Some(last) = window.last() else {
                continue;
            };
            let mut row = FeatureRow::with_capacity(columns.len() * 2);
            let complete = columns.iter().all(|column| {
                scratch.clear();
                scratch.extend(window.iter().map_while(|b| b.value(column)));
                if scratch.len() != window.len() {
                    return false;
                }
                match mean_std(&scratch) {
                    Some((mean, std)) => {
                        row.insert(format!("{group}_{column}_mean"), mean);
                        row.insert(format!("{group}_{column}_std"), std);
                        true
                    }
                    None => false,
                }
            });
            if complete {
                out.insert(last.key, row);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::BucketKey;

    fn series(xs: &[f64]) -> Vec<Bucket> {
        xs.iter()
            .enumerate()
            .map(|(i, x)| Bucket::new(BucketKey(i as i64), 1.0, [("x".to_string(), *x)].into()))
            .collect()
    }

    fn columns() -> Vec<String> {
        vec!["x".to_string()]
    }

    #[test]
    fn test_window_of_three() {
        let stats = RollingStatsComputer::new(3).compute("motion", &series(&[1.0, 2.0, 3.0]), &columns());

        assert_eq!(stats.len(), 1);
        let row = &stats[&BucketKey(2)];
        assert_eq!(row["motion_x_mean"], 2.0);
        assert!((row["motion_x_std"] - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_buckets() {
        let stats = RollingStatsComputer::new(4).compute("motion", &series(&[1.0, 2.0, 3.0]), &columns());
        assert!(stats.is_empty());
    }

    #[test]
    fn test_constant_window_has_zero_std() {
        let stats = RollingStatsComputer::new(3).compute("g", &series(&[0.1, 0.1, 0.1, 0.1]), &columns());

        assert_eq!(stats.len(), 2);
        for row in stats.values() {
            assert_eq!(row["g_x_std"], 0.0);
        }
    }

    #[test]
    fn test_missing_value_invalidates_row() {
        let mut buckets = series(&[1.0, 2.0, 3.0, 4.0]);
        buckets[1].values.insert("x".to_string(), f64::NAN);
        let stats = RollingStatsComputer::new(2).compute("g", &buckets, &columns());

        // windows ending at 1 and 2 contain the NaN
        let keys: Vec<i64> = stats.keys().map(|k| k.0).collect();
        assert_eq!(keys, vec![3]);
    }

    #[test]
    fn test_window_size_one_passes_values() {
        let stats = RollingStatsComputer::new(1).compute("o", &series(&[0.25, 0.75]), &columns());
        assert_eq!(stats[&BucketKey(1)]["o_x_mean"], 0.75);
        assert_eq!(stats[&BucketKey(1)]["o_x_std"], 0.0);
    }
}
