//! Argmax + confidence threshold.

use contracts::PosturePrediction;

/// Predictions below this confidence are reported as `unclassified`
pub const CONFIDENCE_THRESHOLD: f64 = 0.3;

/// Turns a normalized probability vector into a prediction
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    class_labels: Vec<String>,
}

impl DecisionPolicy {
    pub fn new(class_labels: Vec<String>) -> Self {
        Self { class_labels }
    }

    pub fn class_labels(&self) -> &[String] {
        &self.class_labels
    }

    /// Decide on one probability vector
    ///
    /// Ties go to the first maximum; NaN never wins. The confidence is
    /// `max(0, value)` and is kept even when the label becomes
    /// `unclassified`.
    pub fn decide(&self, probabilities: &[f64]) -> PosturePrediction {
        let Some((index, value)) = argmax(probabilities) else {
            return PosturePrediction::unclassified(0.0);
        };
        let confidence = value.max(0.0);
        let narrowed = confidence.min(1.0) as f32;

        match self.class_labels.get(index) {
            Some(label) if confidence >= CONFIDENCE_THRESHOLD => PosturePrediction::new(label.clone(), narrowed),
            _ => PosturePrediction::unclassified(narrowed),
        }
    }
}

/// First index of the largest non-NaN value
fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> DecisionPolicy {
        DecisionPolicy::new(vec!["straight".into(), "slouching".into(), "leaning_back".into()])
    }

    #[test]
    fn test_empty_vector_is_unclassified() {
        assert_eq!(policy().decide(&[]), PosturePrediction::new("unclassified", 0.0));
    }

    #[test]
    fn test_argmax_label() {
        let prediction = policy().decide(&[0.1, 0.7, 0.2]);
        assert_eq!(prediction.label, "slouching");
        assert!((prediction.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_tie_breaks_on_first_occurrence() {
        assert_eq!(policy().decide(&[0.4, 0.4, 0.2]).label, "straight");
    }

    #[test]
    fn test_low_confidence_preserved() {
        let prediction = policy().decide(&[0.25, 0.2, 0.29]);
        assert!(prediction.is_unclassified());
        assert!((prediction.confidence - 0.29).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(policy().decide(&[0.3, 0.2, 0.1]).label, "straight");
    }

    #[test]
    fn test_negative_scores_clamp_to_zero() {
        let prediction = policy().decide(&[-2.0, -1.0, -3.0]);
        assert!(prediction.is_unclassified());
        assert_eq!(prediction.confidence, 0.0);
    }

    #[test]
    fn test_nan_never_wins() {
        assert_eq!(policy().decide(&[f64::NAN, 0.6, 0.4]).label, "slouching");
        assert!(policy().decide(&[f64::NAN]).is_unclassified());
    }

    #[test]
    fn test_index_beyond_labels() {
        let short = DecisionPolicy::new(vec!["straight".into()]);
        let prediction = short.decide(&[0.1, 0.9]);
        assert!(prediction.is_unclassified());
        assert!((prediction.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_clamped_to_one() {
        assert_eq!(policy().decide(&[5.0, 0.0, 0.0]).confidence, 1.0);
    }
}
