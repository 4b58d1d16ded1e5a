//! Prediction and session outputs, plus the raw classifier output shapes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{ContractError, COLLECTING_LABEL, UNCLASSIFIED_LABEL};

/// Decision for one processing cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosturePrediction {
    /// Posture label (one of the class labels, `unclassified` or `collecting`)
    pub label: String,

    /// Confidence in `[0, 1]`
    pub confidence: f32,
}

impl PosturePrediction {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// Placeholder shown until the first successful cycle
    pub fn collecting() -> Self {
        Self::new(COLLECTING_LABEL, 0.0)
    }

    /// Below-threshold or empty decision
    pub fn unclassified(confidence: f32) -> Self {
        Self::new(UNCLASSIFIED_LABEL, confidence)
    }

    pub fn is_collecting(&self) -> bool {
        self.label == COLLECTING_LABEL
    }

    pub fn is_unclassified(&self) -> bool {
        self.label == UNCLASSIFIED_LABEL
    }
}

/// Time apportioned to one label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub label: String,
    pub duration_seconds: u64,
    pub percentage: f64,
}

/// Session summary computed once at stop
///
/// Invariant: the durations of a non-empty breakdown sum to `total_duration`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionResult {
    /// Session length (whole seconds)
    pub total_duration: u64,

    /// Sorted by descending duration
    pub breakdown: Vec<BreakdownEntry>,
}

impl SessionResult {
    /// Result with no breakdown (no events or zero duration)
    pub fn empty(total_duration: u64) -> Self {
        Self {
            total_duration,
            breakdown: Vec::new(),
        }
    }

    /// Sum of allocated durations
    pub fn allocated_seconds(&self) -> u64 {
        self.breakdown.iter().map(|e| e.duration_seconds).sum()
    }

    /// Duration allocated to a label (0 when absent)
    pub fn duration_of(&self, label: &str) -> u64 {
        self.breakdown
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.duration_seconds)
            .unwrap_or(0)
    }
}

/// Raw classifier result, in any of the accepted shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassifierOutput {
    /// `[p0, p1, ...]` aligned with the class labels by position
    FlatArray(Vec<f64>),

    /// `[[p0, p1, ...]]` single-row batch
    NestedArray(Vec<Vec<f64>>),

    /// `{"label": p, ...}` aligned by name
    LabelMap(HashMap<String, f64>),
}

impl ClassifierOutput {
    /// Decode a JSON value into one of the accepted shapes
    ///
    /// # Errors
    /// `ContractError::ClassifierOutput` when the value matches none of them.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ContractError> {
        serde_json::from_value(value).map_err(|e| {
            ContractError::classifier_output(format!(
                "expected flat array, nested array or label map: {e}"
            ))
        })
    }

    /// Shape name for logs
    pub fn shape(&self) -> &'static str {
        match self {
            ClassifierOutput::FlatArray(_) => "flat_array",
            ClassifierOutput::NestedArray(_) => "nested_array",
            ClassifierOutput::LabelMap(_) => "label_map",
        }
    }
}
