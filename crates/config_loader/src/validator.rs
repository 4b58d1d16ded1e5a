//! Configuration validation module
//!
//! Rules:
//! - field-level bounds (`interval > 0`, `window_size >= 1`, non-empty label/feature lists)
//! - class labels and feature columns are unique
//! - every range is finite with `min <= max`
//! - orientation features are a subset of yaw/pitch/roll
//! - PCA bundle shapes are consistent and every input names a motion stream column
//! - stream layouts are non-empty; group names are non-empty and distinct

use std::collections::HashSet;

use contracts::{ColumnRef, ContractError, FeatureConfig, PcaBundle, ORIENTATION_COLUMNS};
use validator::Validate;

/// Validate a FeatureConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &FeatureConfig) -> Result<(), ContractError> {
    config.validate()?;
    validate_unique("class_labels", &config.class_labels)?;
    validate_unique("feature_columns", &config.feature_columns)?;
    validate_ranges(config)?;
    validate_orientation_features(config)?;
    validate_streams(config)?;
    validate_groups(config)?;
    if let Some(pca) = &config.pca {
        validate_pca(pca)?;
    }
    Ok(())
}

fn validate_unique(field: &str, values: &[String]) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(ContractError::config_validation(
                format!("{field}[{value}]"),
                format!("duplicate entry '{value}'"),
            ));
        }
    }
    Ok(())
}

/// Validate range table
fn validate_ranges(config: &FeatureConfig) -> Result<(), ContractError> {
    for (key, range) in &config.ranges {
        if !range.min.is_finite() || !range.max.is_finite() {
            return Err(ContractError::config_validation(
                format!("ranges[{key}]"),
                "min and max must be finite",
            ));
        }
        if range.min > range.max {
            return Err(ContractError::config_validation(
                format!("ranges[{key}]"),
                format!("min ({}) must be <= max ({})", range.min, range.max),
            ));
        }
    }
    Ok(())
}

fn validate_orientation_features(config: &FeatureConfig) -> Result<(), ContractError> {
    let Some(features) = &config.orientation_features else {
        return Ok(());
    };
    validate_unique("orientation_features", features)?;
    for feature in features {
        if !ORIENTATION_COLUMNS.contains(&feature.as_str()) {
            return Err(ContractError::config_validation(
                "orientation_features",
                format!("'{feature}' is not one of {ORIENTATION_COLUMNS:?}"),
            ));
        }
    }
    Ok(())
}

fn validate_streams(config: &FeatureConfig) -> Result<(), ContractError> {
    for (kind, spec) in &config.streams {
        if !kind.is_motion() {
            return Err(ContractError::config_validation(
                format!("streams.{kind}"),
                "only motion streams have a configurable layout",
            ));
        }
        if spec.columns.is_empty() {
            return Err(ContractError::config_validation(
                format!("streams.{kind}.columns"),
                "stream must declare at least one column",
            ));
        }
        validate_unique(&format!("streams.{kind}.columns"), &spec.columns)?;
        if let Some(magnitude) = &spec.magnitude {
            if magnitude.axes.is_empty() {
                return Err(ContractError::config_validation(
                    format!("streams.{kind}.magnitude.axes"),
                    "magnitude needs at least one axis",
                ));
            }
            if spec.columns.contains(&magnitude.name) {
                return Err(ContractError::config_validation(
                    format!("streams.{kind}.magnitude.name"),
                    format!("'{}' collides with a base column", magnitude.name),
                ));
            }
        }
    }
    Ok(())
}

fn validate_groups(config: &FeatureConfig) -> Result<(), ContractError> {
    if config.motion_group.is_empty() || config.orientation_group.is_empty() {
        return Err(ContractError::config_validation(
            "motion_group / orientation_group",
            "group names cannot be empty",
        ));
    }
    if config.motion_group == config.orientation_group {
        return Err(ContractError::config_validation(
            "motion_group / orientation_group",
            format!("group names must differ, both are '{}'", config.motion_group),
        ));
    }
    Ok(())
}

/// Validate PCA bundle shapes
fn validate_pca(pca: &PcaBundle) -> Result<(), ContractError> {
    let inputs = pca.input_columns.len();
    if inputs == 0 {
        return Err(ContractError::config_validation(
            "pca.input_columns",
            "PCA needs at least one input column",
        ));
    }
    if pca.component_count == 0 {
        return Err(ContractError::config_validation(
            "pca.component_count",
            "component_count must be >= 1",
        ));
    }
    if pca.output_prefix.is_empty() {
        return Err(ContractError::config_validation(
            "pca.output_prefix",
            "output_prefix cannot be empty",
        ));
    }
    if pca.component_matrix.len() != pca.component_count {
        return Err(ContractError::config_validation(
            "pca.component_matrix",
            format!(
                "expected {} rows (component_count), got {}",
                pca.component_count,
                pca.component_matrix.len()
            ),
        ));
    }
    for (idx, row) in pca.component_matrix.iter().enumerate() {
        if row.len() != inputs {
            return Err(ContractError::config_validation(
                format!("pca.component_matrix[{idx}]"),
                format!("expected {inputs} columns, got {}", row.len()),
            ));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(ContractError::config_validation(
                format!("pca.component_matrix[{idx}]"),
                "matrix entries must be finite",
            ));
        }
    }
    if pca.mean_vector.len() != inputs {
        return Err(ContractError::config_validation(
            "pca.mean_vector",
            format!("expected {inputs} entries, got {}", pca.mean_vector.len()),
        ));
    }
    validate_unique("pca.input_columns", &pca.input_columns)?;
    for column in &pca.input_columns {
        match ColumnRef::parse(column) {
            Some(column_ref) if column_ref.stream.is_motion() => {}
            _ => {
                return Err(ContractError::config_validation(
                    "pca.input_columns",
                    format!("'{column}' must be '<motion stream>.<column>'"),
                ));
            }
        }
    }
    Ok(())
}
