//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use faultline_core::{ExecutionMode, MetaVisibility, APP_ENV_VAR};

use crate::{ConfigError, FaultlineConfig};

/// Default prefix for environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "FAULTLINE";

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables (`FAULTLINE__SECTION__KEY`, plus `APP_ENV`)
///
/// # Example
///
/// ```no_run
/// use faultline_config::ConfigLoader;
///
/// # fn main() -> Result<(), faultline_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("faultline.toml")?
///     .with_env_prefix("FAULTLINE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: FaultlineConfig,
    env_prefix: Option<String>,
    file_loaded: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: FaultlineConfig::default(),
            env_prefix: None,
            file_loaded: false,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = FaultlineConfig::default();
        self
    }

    /// Start with development preset configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use faultline_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = FaultlineConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = FaultlineConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats.
    /// The file format is determined by the file extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let file_config = Self::parse_file(&content, path)?;
        self.merge_config(file_config);
        self.file_loaded = true;

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// `format` is `"toml"` or `"json"`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the content is invalid or the format is
    /// unsupported.
    ///
    /// # Example
    ///
    /// ```
    /// use faultline_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[i18n]\ndefault_language = \"fr\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.i18n.default_language, "fr");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let file_config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {other}"
                )))
            }
        };
        self.merge_config(file_config);
        self.file_loaded = true;
        Ok(self)
    }

    /// Enable environment variable overrides with the given prefix.
    ///
    /// Variables use the `PREFIX__SECTION__KEY` layout, e.g.
    /// `FAULTLINE__I18N__DEFAULT_LANGUAGE=fr`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Load a `.env` file into the process environment, if one exists.
    ///
    /// # Errors
    ///
    /// Never fails today; the `Result` keeps the builder chain uniform.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        // Load .env file, ignore if not found
        let _ = dotenvy::dotenv();
        Ok(self)
    }

    /// Returns `true` if a file or string layer has been applied.
    #[must_use]
    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Environment variable parsing fails
    /// - Configuration validation fails
    pub fn load(mut self) -> Result<FaultlineConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix, env::vars())?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without validation.
    #[must_use]
    pub fn load_unvalidated(self) -> FaultlineConfig {
        self.config
    }

    // Parse configuration file based on extension
    fn parse_file(content: &str, path: &Path) -> Result<FaultlineConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    // Sections absent from the file keep their serde defaults, not the
    // preset's values.
    fn merge_config(&mut self, file_config: FaultlineConfig) {
        self.config = file_config;
    }

    // Apply the prefixed variables, then `APP_ENV` unless the mode was set
    // explicitly.
    fn apply_env_overrides<I>(&mut self, prefix: &str, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let scoped = format!("{prefix}__");
        let mode_key = format!("{prefix}__MODE");

        let mut app_env = None;
        let mut env_vars = HashMap::new();
        for (key, value) in vars {
            if key == APP_ENV_VAR {
                app_env = Some(value);
            } else if key.starts_with(&scoped) {
                env_vars.insert(key, value);
            }
        }

        if let Some(signal) = app_env {
            if !env_vars.contains_key(&mode_key) {
                self.config.mode = ExecutionMode::from_signal(&signal);
            }
        }

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    // Apply a single environment variable
    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            ["MODE"] => {
                self.config.mode = ExecutionMode::from_signal(value);
            }

            // Catalog section
            ["CATALOG", "REJECT_DUPLICATES"] => {
                self.config.catalog.reject_duplicates = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["CATALOG", "RELAXED_KEY_FORMAT"] => {
                self.config.catalog.relaxed_key_format = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["CATALOG", "DEFINITIONS_PATH"] => {
                self.config.catalog.definitions_path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }

            // I18n section
            ["I18N", "DEFAULT_LANGUAGE"] => {
                self.config.i18n.default_language = value.to_string();
            }

            // Headers section
            ["HEADERS", "TRACE_ID"] => {
                self.config.headers.trace_id = value.to_string();
            }
            ["HEADERS", "USER_ID"] => {
                self.config.headers.user_id = value.to_string();
            }
            ["HEADERS", "READ_ACCEPT_LANGUAGE"] => {
                self.config.headers.read_accept_language = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // Exposure section
            ["EXPOSURE", "GENERIC_MESSAGE"] => {
                self.config.exposure.generic_message = value.to_string();
            }
            ["EXPOSURE", "META"] => {
                self.config.exposure.meta = match value.to_lowercase().as_str() {
                    "always" => MetaVisibility::Always,
                    "exposed_only" => MetaVisibility::ExposedOnly,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'always' or 'exposed_only'",
                        ))
                    }
                };
            }

            // Telemetry section
            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                self.config.telemetry.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => {
                self.config.telemetry.logging.level = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "JSON_FORMAT"] => {
                self.config.telemetry.logging.json_format = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
                self.config.telemetry.logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["TELEMETRY", "METRICS", "ENABLED"] => {
                self.config.telemetry.metrics.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            _ => {
                tracing::debug!(var = %key, "ignoring unknown configuration variable");
            }
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
