//! Label history → time-weighted session breakdown.
//!
//! Durations are apportioned with the largest-remainder method on exact
//! integer arithmetic, so the allocated seconds always sum to the total.

use contracts::{BreakdownEntry, PosturePrediction, SessionResult};
use tracing::debug;

/// Append-only label history for one session
#[derive(Debug, Clone, Default)]
pub struct SessionAggregator {
    history: Vec<String>,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a prediction; `collecting` placeholders are ignored
    ///
    /// Returns whether the prediction was recorded.
    pub fn record(&mut self, prediction: &PosturePrediction) -> bool {
        if prediction.is_collecting() {
            return false;
        }
        self.history.push(prediction.label.clone());
        true
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Apportion `total_duration` seconds across the recorded labels
    ///
    /// Sorted by descending duration; equal durations keep first-appearance
    /// order. Empty breakdown for an empty history or a zero total.
    pub fn summarize(&self, total_duration: u64) -> SessionResult {
        if self.history.is_empty() || total_duration == 0 {
            return SessionResult::empty(total_duration);
        }

        let events = self.history.len() as u128;
        let total = total_duration as u128;

        // (label, count) in first-appearance order
        let mut counts: Vec<(&str, u128)> = Vec::new();
        for label in &self.history {
            match counts.iter_mut().find(|(l, _)| *l == label.as_str()) {
                Some((_, count)) => *count += 1,
                None => counts.push((label.as_str(), 1)),
            }
        }

        // base = floor(count * total / events); remainder compared on the numerator
        let mut shares: Vec<(&str, u128, u128)> = counts
            .iter()
            .map(|(label, count)| (*label, count * total / events, count * total % events))
            .collect();

        let allocated: u128 = shares.iter().map(|(_, base, _)| base).sum();
        let mut leftover = total - allocated;

        let mut order: Vec<usize> = (0..shares.len()).collect();
        order.sort_by(|a, b| shares[*b].2.cmp(&shares[*a].2));
        for index in order {
            if leftover == 0 {
                break;
            }
            shares[index].1 += 1;
            leftover -= 1;
        }

        // Stable: ties keep first-appearance order
        shares.sort_by(|a, b| b.1.cmp(&a.1));

        debug!(
            events = self.history.len(),
            labels = shares.len(),
            total_duration,
            "session apportioned"
        );

        let breakdown = shares
            .into_iter()
            .map(|(label, seconds, _)| BreakdownEntry {
                label: label.to_string(),
                duration_seconds: seconds as u64,
                percentage: seconds as f64 / total_duration as f64 * 100.0,
            })
            .collect();

        SessionResult {
            total_duration,
            breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator(entries: &[(&str, usize)]) -> SessionAggregator {
        let mut aggregator = SessionAggregator::new();
        for (label, count) in entries {
            for _ in 0..*count {
                aggregator.record(&PosturePrediction::new(*label, 0.9));
            }
        }
        aggregator
    }

    #[test]
    fn test_largest_remainder_example() {
        let result = aggregator(&[("straight", 34), ("slouching", 33), ("leaning_back", 33)]).summarize(10);

        assert_eq!(result.total_duration, 10);
        assert_eq!(result.duration_of("straight"), 4);
        assert_eq!(result.duration_of("slouching"), 3);
        assert_eq!(result.duration_of("leaning_back"), 3);
        assert_eq!(result.breakdown[0].label, "straight");
        assert_eq!(result.breakdown[1].label, "slouching");
        assert_eq!(result.breakdown[0].percentage, 40.0);
    }

    #[test]
    fn test_empty_history() {
        let result = SessionAggregator::new().summarize(30);
        assert_eq!(result, SessionResult::empty(30));
    }

    #[test]
    fn test_zero_duration() {
        let result = aggregator(&[("straight", 5)]).summarize(0);
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn test_collecting_ignored() {
        let mut aggregator = SessionAggregator::new();
        assert!(!aggregator.record(&PosturePrediction::collecting()));
        assert!(aggregator.record(&PosturePrediction::unclassified(0.1)));
        assert_eq!(aggregator.history(), &["unclassified".to_string()]);
    }

    #[test]
    fn test_unclassified_apportioned_like_any_label() {
        let result = aggregator(&[("unclassified", 1), ("straight", 3)]).summarize(8);
        assert_eq!(result.duration_of("unclassified"), 2);
        assert_eq!(result.duration_of("straight"), 6);
    }

    #[test]
    fn test_remainder_ties_follow_first_appearance() {
        // 3 labels, 1 event each, 4 seconds: base 1 each, one leftover
        let result = aggregator(&[("b", 1), ("a", 1), ("c", 1)]).summarize(4);
        assert_eq!(result.breakdown[0].label, "b");
        assert_eq!(result.breakdown[0].duration_seconds, 2);
        assert_eq!(result.breakdown[1].label, "a");
        assert_eq!(result.breakdown[2].label, "c");
    }

    #[test]
    fn test_rare_label_may_get_zero_seconds() {
        let result = aggregator(&[("straight", 99), ("slouching", 1)]).summarize(10);
        assert_eq!(result.duration_of("straight"), 10);
        assert_eq!(result.duration_of("slouching"), 0);
        assert_eq!(result.breakdown.len(), 2);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn allocation_sums_to_total(
            counts in proptest::collection::vec(1usize..50, 1..6),
            total in 1u64..100_000,
        ) {
            let mut aggregator = SessionAggregator::new();
            for (i, count) in counts.iter().enumerate() {
                for _ in 0..*count {
                    aggregator.record(&PosturePrediction::new(format!("label{i}"), 0.5));
                }
            }
            let result = aggregator.summarize(total);
            prop_assert_eq!(result.allocated_seconds(), total);
            prop_assert!(result.breakdown.windows(2).all(|w| w[0].duration_seconds >= w[1].duration_seconds));
        }
    }
}
