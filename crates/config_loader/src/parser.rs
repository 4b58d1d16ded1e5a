//! Configuration parsing module
//!
//! Supports TOML (primary) and JSON (the format training pipelines usually export).

use contracts::{ContractError, FeatureConfig};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<FeatureConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<FeatureConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration according to format
pub fn parse(content: &str, format: ConfigFormat) -> Result<FeatureConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
interval = 0.5
trim_seconds = 2.0
window_size = 4
class_labels = ["straight", "slouching", "leaning_back"]
feature_columns = ["orientation_pitch_mean", "orientation_pitch_std"]

[ranges]
"orientation.pitch" = { min = -90.0, max = 90.0 }
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.window_size, 4);
        assert_eq!(config.class_labels.len(), 3);
        assert_eq!(config.feature_columns.len(), 2);
    }

    #[test]
    fn test_parse_json_with_pca() {
        let content = r#"{
            "ranges": { "accelerometer.x": { "min": -20.0, "max": 20.0 } },
            "interval": 0.5,
            "trim_seconds": 0.0,
            "window_size": 2,
            "class_labels": ["straight", "slouching"],
            "feature_columns": ["motion_motion_pc1_mean"],
            "pca": {
                "input_columns": ["accelerometer.x", "gyroscope.x"],
                "component_matrix": [[0.6, 0.8]],
                "mean_vector": [0.5, 0.5],
                "output_prefix": "motion",
                "component_count": 1
            }
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let pca = result.unwrap().pca.unwrap();
        assert_eq!(pca.component_name(0), "motion_pc1");
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_missing_required_field() {
        // No class_labels
        let content = r#"
interval = 0.5
trim_seconds = 0.0
window_size = 3
feature_columns = ["a"]
[ranges]
"#;
        let err = parse_toml(content).unwrap_err();
        assert!(err.to_string().contains("class_labels"), "got: {err}");
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
