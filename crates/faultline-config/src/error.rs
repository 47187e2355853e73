//! Configuration error types.

use faultline_core::CatalogError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read configuration file.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// The field with the invalid value.
        field: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },

    /// Validation error after loading.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

impl ConfigError {
    /// Create a new file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a new invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new environment variable parse error.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Create a new validation error.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

/// Errors that can occur while loading error definitions.
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// Definitions file not found.
    #[error("error definitions file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read the definitions file.
    #[error("failed to read error definitions file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not a YAML list of definitions.
    #[error("failed to parse error definitions: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A record is missing a required value.
    #[error("invalid error definition #{index} ({key:?}): {reason}")]
    InvalidDefinition {
        /// Zero-based position in the list.
        index: usize,
        /// Key of the record (may be empty).
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Registration was refused by a strict catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl DefinitionError {
    /// Create a new invalid definition error.
    pub fn invalid_definition(
        index: usize,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidDefinition {
            index,
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_error() {
        let err = ConfigError::file_not_found("/path/to/faultline.toml");
        assert!(err.to_string().contains("/path/to/faultline.toml"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("i18n.default_language", "must not be empty");
        assert!(err.to_string().contains("i18n.default_language"));
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_env_parse_error() {
        let err = ConfigError::env_parse_error("FAULTLINE__CATALOG__REJECT_DUPLICATES", "expected boolean");
        assert!(err.to_string().contains("FAULTLINE__CATALOG__REJECT_DUPLICATES"));
        assert!(err.to_string().contains("expected boolean"));
    }

    #[test]
    fn test_invalid_definition_error() {
        let err = DefinitionError::invalid_definition(2, "", "key must not be empty");
        assert_eq!(
            err.to_string(),
            "invalid error definition #2 (\"\"): key must not be empty"
        );
    }

    #[test]
    fn test_catalog_error_is_transparent() {
        let err = DefinitionError::from(CatalogError::DuplicateKey {
            key: "teapot".to_string(),
        });
        assert!(err.to_string().contains("teapot"));
    }
}
