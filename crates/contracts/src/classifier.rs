//! Classifier trait - opaque model interface
//!
//! The numeric model is an external collaborator; the pipeline only hands it
//! one ordered feature vector per cycle and normalizes whatever comes back.

use crate::{ClassifierOutput, ContractError};

/// Synchronous classifier
///
/// Invoked once per processing cycle while the session lock is held, so
/// implementations must not block on I/O.
pub trait Classifier: Send + Sync {
    /// Name used in logs and metrics
    fn name(&self) -> &str {
        "classifier"
    }

    /// Score one feature vector (length == `feature_columns.len()`)
    ///
    /// # Errors
    /// Returns a classifier error when the model cannot run; the cycle is
    /// abandoned without emitting a prediction.
    fn classify(&self, features: &[f64]) -> Result<ClassifierOutput, ContractError>;
}

impl<F> Classifier for F
where
    F: Fn(&[f64]) -> Result<ClassifierOutput, ContractError> + Send + Sync,
{
    fn classify(&self, features: &[f64]) -> Result<ClassifierOutput, ContractError> {
        self(features)
    }
}
