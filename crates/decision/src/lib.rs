//! # Decision
//!
//! Classifier output → prediction → session summary.
//!
//! - [`normalize`]: reduces flat / nested / label-map outputs to one vector
//! - [`DecisionPolicy`]: argmax with a fixed confidence threshold
//! - [`SessionAggregator`]: largest-remainder duration apportionment
//! - [`LinearSoftmaxClassifier`]: reference `Classifier` implementation

mod linear;
mod output;
mod policy;
mod session;

pub use linear::{softmax, LinearModel, LinearSoftmaxClassifier};
pub use output::{normalize, normalize_json};
pub use policy::{DecisionPolicy, CONFIDENCE_THRESHOLD};
pub use session::SessionAggregator;

use contracts::{Classifier, ContractError, PosturePrediction};

/// Run the classifier on one vector and decide
///
/// # Errors
/// Classifier failure or unparseable output; the caller decides what the
/// failed cycle means.
pub fn classify_and_decide(
    classifier: &dyn Classifier,
    policy: &DecisionPolicy,
    features: &[f64],
) -> Result<PosturePrediction, ContractError> {
    let output = classifier.classify(features)?;
    let probabilities = normalize(&output, policy.class_labels())?;
    Ok(policy.decide(&probabilities))
}
