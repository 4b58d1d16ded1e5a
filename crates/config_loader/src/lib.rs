//! # Config Loader
//!
//! Loads the immutable feature configuration bundle (the ParamsProvider).
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality, failing fast on the first violation
//! - Produce a `FeatureConfig` that is never mutated afterwards
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("features.toml")).unwrap();
//! println!("labels: {:?}", config.class_labels);
//! ```

mod parser;
mod validator;

pub use contracts::FeatureConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;
use tracing::debug;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure (including missing required fields)
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<FeatureConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        let config = Self::load_from_str(&content, format)?;
        debug!(
            path = %path.display(),
            features = config.feature_columns.len(),
            labels = config.class_labels.len(),
            "feature config loaded"
        );
        Ok(config)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<FeatureConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already-constructed configuration
    pub fn validate(config: &FeatureConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize FeatureConfig to TOML string
    pub fn to_toml(config: &FeatureConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize FeatureConfig to JSON string
    pub fn to_json(config: &FeatureConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<FeatureConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}
