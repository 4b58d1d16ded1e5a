//! Posture pipeline metrics.
//!
//! Recording functions forward to the global `metrics` recorder (a no-op
//! until an exporter is installed). `CycleStatsAggregator` keeps an
//! in-memory summary for end-of-session reports.

use std::collections::BTreeMap;
use std::fmt;

use contracts::PosturePrediction;
use metrics::{counter, gauge, histogram};
use serde::Serialize;

/// Outcome of one processing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// A prediction was produced and delivered
    Predicted,
    /// Not enough buffered data for a feature vector
    InsufficientData,
    /// Classifier failed or its output was unparseable
    ClassifierFailed,
    /// Session already stopped when the cycle acquired the lock
    Inactive,
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::Predicted => "predicted",
            CycleOutcome::InsufficientData => "insufficient_data",
            CycleOutcome::ClassifierFailed => "classifier_failed",
            CycleOutcome::Inactive => "inactive",
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record the outcome and duration of one cycle
pub fn record_cycle(outcome: CycleOutcome, latency_ms: f64) {
    counter!("posture_cycles_total", "outcome" => outcome.as_str()).increment(1);
    histogram!("posture_cycle_latency_ms").record(latency_ms);
}

/// Record a delivered prediction
pub fn record_prediction(prediction: &PosturePrediction) {
    counter!("posture_predictions_total", "label" => prediction.label.clone()).increment(1);
    histogram!("posture_prediction_confidence").record(prediction.confidence as f64);
}

/// Record a prediction the consumer could not accept
pub fn record_prediction_dropped() {
    counter!("posture_predictions_dropped_total").increment(1);
}

/// Record an ingested sample
pub fn record_sample_recorded(stream: &str) {
    counter!("posture_samples_recorded_total", "stream" => stream.to_string()).increment(1);
}

/// Record samples lost to ring overflow or a pre-origin timestamp
pub fn record_samples_dropped(count: u64) {
    if count > 0 {
        counter!("posture_samples_dropped_total").increment(count);
    }
}

/// Record a stream's buffer depth
pub fn record_buffer_depth(stream: &str, depth: usize) {
    gauge!("posture_buffer_depth", "stream" => stream.to_string()).set(depth as f64);
}

/// Cycle statistics aggregator
///
/// Aggregates cycle outcomes in memory for the session report.
#[derive(Debug, Clone, Default)]
pub struct CycleStatsAggregator {
    /// Cycles by outcome
    pub outcomes: BTreeMap<&'static str, u64>,

    /// Predictions by label
    pub label_counts: BTreeMap<String, u64>,

    /// Confidence of delivered predictions
    pub confidence_stats: RunningStats,

    /// Cycle duration (ms)
    pub latency_stats: RunningStats,
}

impl CycleStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with one cycle
    pub fn update(&mut self, outcome: CycleOutcome, latency_ms: f64) {
        *self.outcomes.entry(outcome.as_str()).or_insert(0) += 1;
        self.latency_stats.push(latency_ms);
    }

    /// Update with one delivered prediction
    pub fn update_prediction(&mut self, prediction: &PosturePrediction) {
        *self.label_counts.entry(prediction.label.clone()).or_insert(0) += 1;
        self.confidence_stats.push(prediction.confidence as f64);
    }

    pub fn total_cycles(&self) -> u64 {
        self.outcomes.values().sum()
    }

    pub fn count(&self, outcome: CycleOutcome) -> u64 {
        self.outcomes.get(outcome.as_str()).copied().unwrap_or(0)
    }

    /// Generate a summary report
    pub fn summary(&self) -> CycleSummary {
        let total = self.total_cycles();
        let predicted = self.count(CycleOutcome::Predicted);
        CycleSummary {
            total_cycles: total,
            predicted,
            insufficient_data: self.count(CycleOutcome::InsufficientData),
            classifier_failed: self.count(CycleOutcome::ClassifierFailed),
            prediction_rate: if total > 0 {
                predicted as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            confidence: StatsSummary::from(&self.confidence_stats),
            latency_ms: StatsSummary::from(&self.latency_stats),
            label_counts: self.label_counts.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Cycle summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleSummary {
    pub total_cycles: u64,
    pub predicted: u64,
    pub insufficient_data: u64,
    pub classifier_failed: u64,
    pub prediction_rate: f64,
    pub confidence: StatsSummary,
    pub latency_ms: StatsSummary,
    pub label_counts: BTreeMap<String, u64>,
}

impl fmt::Display for CycleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Cycle Summary ===")?;
        writeln!(f, "Total cycles: {}", self.total_cycles)?;
        writeln!(
            f,
            "Predictions: {} ({:.2}%)",
            self.predicted, self.prediction_rate
        )?;
        writeln!(f, "Insufficient data: {}", self.insufficient_data)?;
        writeln!(f, "Classifier failures: {}", self.classifier_failed)?;
        writeln!(f, "Confidence: {}", self.confidence)?;
        writeln!(f, "Cycle latency (ms): {}", self.latency_ms)?;

        if !self.label_counts.is_empty() {
            writeln!(f, "Predictions by label:")?;
            for (label, count) in &self.label_counts {
                writeln!(f, "  {}: {}", label, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = CycleStatsAggregator::new();
        aggregator.update(CycleOutcome::InsufficientData, 0.4);
        aggregator.update(CycleOutcome::Predicted, 1.2);
        aggregator.update_prediction(&PosturePrediction::new("straight", 0.8));
        aggregator.update(CycleOutcome::Predicted, 1.0);
        aggregator.update_prediction(&PosturePrediction::new("straight", 0.6));

        let summary = aggregator.summary();
        assert_eq!(summary.total_cycles, 3);
        assert_eq!(summary.predicted, 2);
        assert_eq!(summary.insufficient_data, 1);
        assert_eq!(summary.label_counts.get("straight"), Some(&2));
        assert!((summary.confidence.mean - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_aggregator_reset() {
        let mut aggregator = CycleStatsAggregator::new();
        aggregator.update(CycleOutcome::Predicted, 1.0);
        aggregator.update_prediction(&PosturePrediction::new("slouching", 0.9));
        aggregator.reset();

        let summary = aggregator.summary();
        assert_eq!(summary.total_cycles, 0);
        assert!(summary.label_counts.is_empty());
        assert_eq!(summary.confidence.count, 0);
    }

    #[test]
    fn test_summary_display() {
        let summary = CycleSummary {
            total_cycles: 100,
            predicted: 95,
            insufficient_data: 5,
            classifier_failed: 0,
            prediction_rate: 95.0,
            confidence: StatsSummary::default(),
            latency_ms: StatsSummary {
                count: 100,
                min: 0.2,
                max: 3.0,
                mean: 0.9,
                std_dev: 0.4,
            },
            label_counts: BTreeMap::from([("slouching".to_string(), 95)]),
        };

        let output = format!("{}", summary);
        assert!(output.contains("Total cycles: 100"));
        assert!(output.contains("95.00%"));
        assert!(output.contains("slouching: 95"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_cycle(CycleOutcome::Predicted, 1.0);
        record_prediction(&PosturePrediction::new("straight", 0.9));
        record_samples_dropped(0);
        record_buffer_depth("gravity", 12);
    }
}
