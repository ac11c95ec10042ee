use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{JwaError, JwaResult};

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JwaConfig {
    pub logging: LoggingConfig,
    pub suite: SuiteConfig,
    pub output: OutputConfig,
}

impl JwaConfig {
    /// Parse a config file from disk.
    pub fn from_file(path: &Path) -> JwaResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| JwaError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> JwaResult<Self> {
        toml::from_str(content).map_err(|e| JwaError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> JwaResult<String> {
        toml::to_string_pretty(self).map_err(|e| JwaError::Config(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

/// Which symmetric algorithms the registry exposes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Algorithm used when the caller names none (default: A256GCM)
    pub default_algorithm: String,
    /// Allow-list of symmetric identifiers; empty means every provided algorithm
    pub enabled_algorithms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON envelopes
    pub pretty: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            default_algorithm: "A256GCM".into(),
            enabled_algorithms: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[logging]
level = "debug"
format = "json"

[suite]
default_algorithm = "A128CBC-HS256"
enabled_algorithms = ["A128CBC-HS256", "A256GCM"]

[output]
pretty = false
"#;
        let config = JwaConfig::from_toml(toml_str).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.suite.default_algorithm, "A128CBC-HS256");
        assert_eq!(config.suite.enabled_algorithms, vec!["A128CBC-HS256", "A256GCM"]);
        assert!(!config.output.pretty);
    }

    #[test]
    fn test_parse_defaults() {
        let config = JwaConfig::from_toml("").unwrap();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
        assert_eq!(config.suite.default_algorithm, "A256GCM");
        assert!(config.suite.enabled_algorithms.is_empty());
        assert!(config.output.pretty);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[suite]
enabled_algorithms = ["A192GCM"]
"#;
        let config = JwaConfig::from_toml(toml_str).unwrap();

        // Overridden
        assert_eq!(config.suite.enabled_algorithms, vec!["A192GCM"]);
        // Defaults
        assert_eq!(config.suite.default_algorithm, "A256GCM");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = JwaConfig::from_toml("[suite\n").unwrap_err();
        assert!(matches!(err, JwaError::Config(_)));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = JwaConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = JwaConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.logging.level, parsed.logging.level);
        assert_eq!(config.suite.default_algorithm, parsed.suite.default_algorithm);
        assert_eq!(config.output.pretty, parsed.output.pretty);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"warn\"").unwrap();

        let config = JwaConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_from_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JwaConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, JwaError::Io(_)));
    }
}
