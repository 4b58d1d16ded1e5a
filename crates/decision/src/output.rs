//! Classifier output normalization.
//!
//! Every accepted shape is reduced to one probability vector aligned with
//! the class labels by position.

use contracts::{ClassifierOutput, ContractError};

/// Normalize a classifier output into `class_labels` order
///
/// Empty flat or nested arrays normalize to an empty vector, which the
/// decision policy maps to `unclassified`.
///
/// # Errors
/// `ClassifierOutput` on a length mismatch, a multi-row or ragged batch, or
/// a label map missing any class label.
pub fn normalize(output: &ClassifierOutput, class_labels: &[String]) -> Result<Vec<f64>, ContractError> {
    match output {
        ClassifierOutput::FlatArray(values) => positional(values, class_labels.len()),
        ClassifierOutput::NestedArray(rows) => match rows.first() {
            None => Ok(Vec::new()),
            Some(row) => positional(row, class_labels.len()),
        },
        ClassifierOutput::LabelMap(map) => class_labels
            .iter()
            .map(|label| {
                map.get(label).copied().ok_or_else(|| {
                    ContractError::classifier_output(format!("label map is missing '{label}'"))
                })
            })
            .collect(),
    }
}

fn positional(values: &[f64], expected: usize) -> Result<Vec<f64>, ContractError> {
    if values.is_empty() {
        return Ok(Vec::new());
    }
    if values.len() != expected {
        return Err(ContractError::classifier_output(format!(
            "expected {expected} probabilities, got {}",
            values.len()
        )));
    }
    Ok(values.to_vec())
}

/// Decode raw JSON and normalize it in one step
pub fn normalize_json(value: serde_json::Value, class_labels: &[String]) -> Result<Vec<f64>, ContractError> {
    normalize(&ClassifierOutput::from_json(value)?, class_labels)
}
