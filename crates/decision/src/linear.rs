//! Reference linear softmax classifier.
//!
//! Model file (JSON):
//!
//! ```json
//! { "labels": ["straight", "slouching"],
//!   "weights": [[0.5, -1.0], [-0.5, 1.0]],
//!   "bias": [0.0, 0.1] }
//! ```

use std::path::Path;

use contracts::{Classifier, ClassifierOutput, ContractError};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Serialized model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub labels: Vec<String>,
    /// `labels × features`
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

/// `softmax(W·x + b)`, reported as a label map
#[derive(Debug, Clone)]
pub struct LinearSoftmaxClassifier {
    model: LinearModel,
    feature_count: usize,
    weights: DMatrix<f64>,
    bias: DVector<f64>,
}

impl LinearSoftmaxClassifier {
    /// Validate shapes and build the classifier
    pub fn new(model: LinearModel) -> Result<Self, ContractError> {
        if model.labels.is_empty() {
            return Err(ContractError::config_validation("model.labels", "model has no labels"));
        }
        if model.weights.len() != model.labels.len() {
            return Err(ContractError::config_validation(
                "model.weights",
                format!("expected {} rows, got {}", model.labels.len(), model.weights.len()),
            ));
        }
        if model.bias.len() != model.labels.len() {
            return Err(ContractError::config_validation(
                "model.bias",
                format!("expected {} entries, got {}", model.labels.len(), model.bias.len()),
            ));
        }
        let feature_count = model.weights.first().map_or(0, Vec::len);
        if let Some(row) = model.weights.iter().position(|r| r.len() != feature_count) {
            return Err(ContractError::config_validation(
                format!("model.weights[{row}]"),
                format!("expected {feature_count} columns"),
            ));
        }
        let flat: Vec<f64> = model.weights.iter().flatten().copied().collect();
        Ok(Self {
            weights: DMatrix::from_row_slice(model.labels.len(), feature_count, &flat),
            bias: DVector::from_column_slice(&model.bias),
            model,
            feature_count,
        })
    }

    /// Load a model from a JSON file
    pub fn load(path: &Path) -> Result<Self, ContractError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ContractError> {
        let model: LinearModel = serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("model parse error: {e}"),
            source: Some(Box::new(e)),
        })?;
        Self::new(model)
    }

    pub fn labels(&self) -> &[String] {
        &self.model.labels
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Class probabilities in label order
    pub fn probabilities(&self, features: &[f64]) -> Result<Vec<f64>, ContractError> {
        if features.len() != self.feature_count {
            return Err(ContractError::classifier(
                self.name(),
                format!("expected {} features, got {}", self.feature_count, features.len()),
            ));
        }
        let logits = &self.weights * DVector::from_column_slice(features) + &self.bias;
        Ok(softmax(logits.as_slice()))
    }
}

impl Classifier for LinearSoftmaxClassifier {
    fn name(&self) -> &str {
        "linear_softmax"
    }

    fn classify(&self, features: &[f64]) -> Result<ClassifierOutput, ContractError> {
        let probabilities = self.probabilities(features)?;
        Ok(ClassifierOutput::LabelMap(
            self.model.labels.iter().cloned().zip(probabilities).collect(),
        ))
    }
}

/// Numerically stable softmax
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MODEL: &str = r#"{
        "labels": ["straight", "slouching"],
        "weights": [[4.0, 0.0], [0.0, 4.0]],
        "bias": [0.0, 0.0]
    }"#;

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn test_probabilities_are_softmax_of_affine_scores() {
        let model = r#"{"labels": ["a", "b"], "weights": [[1.0, 2.0], [3.0, 4.0]], "bias": [0.5, -0.5]}"#;
        let classifier = LinearSoftmaxClassifier::from_json_str(model).unwrap();

        // W·[1, 1] + b = [3.5, 6.5]
        let p = classifier.probabilities(&[1.0, 1.0]).unwrap();
        let expected = softmax(&[3.5, 6.5]);
        for (got, want) in p.iter().zip(&expected) {
            assert!((got - want).abs() < 1e-12, "{p:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_classify_returns_label_map() {
        let classifier = LinearSoftmaxClassifier::from_json_str(MODEL).unwrap();
        let output = classifier.classify(&[1.0, 0.0]).unwrap();
        let ClassifierOutput::LabelMap(map) = output else {
            panic!("expected label map");
        };
        assert!(map["straight"] > 0.9);
    }

    #[test]
    fn test_feature_count_mismatch() {
        let classifier = LinearSoftmaxClassifier::from_json_str(MODEL).unwrap();
        assert!(matches!(
            classifier.classify(&[1.0]),
            Err(ContractError::Classifier { .. })
        ));
    }

    #[test]
    fn test_shape_mismatch_rejected_at_load() {
        let bad = r#"{"labels": ["a", "b"], "weights": [[1.0]], "bias": [0.0, 0.0]}"#;
        assert!(LinearSoftmaxClassifier::from_json_str(bad).is_err());

        let ragged = r#"{"labels": ["a", "b"], "weights": [[1.0], [1.0, 2.0]], "bias": [0.0, 0.0]}"#;
        assert!(LinearSoftmaxClassifier::from_json_str(ragged).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MODEL.as_bytes()).unwrap();
        let classifier = LinearSoftmaxClassifier::load(file.path()).unwrap();
        assert_eq!(classifier.feature_count(), 2);
        assert_eq!(classifier.labels(), &["straight".to_string(), "slouching".to_string()]);
    }
}
