//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce a `MonitoringConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("melody.toml")).unwrap();
//! println!("Application: {}", config.application.name);
//! ```

mod parser;
mod validator;

pub use contracts::MonitoringConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

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
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<MonitoringConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<MonitoringConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Validate a configuration built or modified in code
    ///
    /// # Errors
    /// Returns the first violated rule
    pub fn validate(config: &MonitoringConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize MonitoringConfig to TOML string
    pub fn to_toml(config: &MonitoringConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize MonitoringConfig to JSON string
    pub fn to_json(config: &MonitoringConfig) -> Result<String, ContractError> {
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::CollectorMode;

    const MINIMAL_TOML: &str = r#"
[application]
name = "shop"

[collector]
mode = "collector_server"

[security]
system_actions_enabled = true

[dispatcher]
max_graph_dimension = 1200
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.application.name, "shop");
        assert_eq!(config.collector.mode, CollectorMode::CollectorServer);
        assert!(config.security.system_actions_enabled);
        assert_eq!(config.dispatcher.max_graph_dimension, 1200);
        assert_eq!(config.dispatcher.compression_buffer_size, 4096);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let again = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.application.name, again.application.name);
        assert_eq!(config.dispatcher, again.dispatcher);
        assert_eq!(config.server.listen, again.server.listen);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let again = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.collector.mode, again.collector.mode);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[application]
name = "shop"

[dispatcher]
resource_root = "resources"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("resource_root"));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("melody.toml");
        std::fs::write(&path, MINIMAL_TOML).unwrap();
        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.application.name, "shop");

        let yaml = dir.path().join("melody.yaml");
        std::fs::write(&yaml, "application: {}").unwrap();
        let err = ConfigLoader::load_from_path(&yaml).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
