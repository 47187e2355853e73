//! Main configuration types.
//!
//! This module provides the top-level [`FaultlineConfig`] struct and its builder.

use faultline_core::{ExecutionMode, ExposurePolicy, RegistrationPolicy};
use serde::{Deserialize, Serialize};

use crate::{
    CatalogSection, ConfigError, ExposureSection, HeadersSection, I18nSection, TelemetrySection,
};

/// Complete Faultline configuration.
///
/// This is the root configuration type that contains all configuration sections.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use faultline_config::FaultlineConfig;
///
/// let config = FaultlineConfig::default();
/// assert_eq!(config.i18n.default_language, "en");
/// assert_eq!(config.headers.trace_id, "X-Trace-ID");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct FaultlineConfig {
    /// Execution mode.
    #[serde(default)]
    pub mode: ExecutionMode,

    /// Definition catalog configuration.
    #[serde(default)]
    pub catalog: CatalogSection,

    /// Localization configuration.
    #[serde(default)]
    pub i18n: I18nSection,

    /// Inbound header configuration.
    #[serde(default)]
    pub headers: HeadersSection,

    /// Redaction configuration.
    #[serde(default)]
    pub exposure: ExposureSection,

    /// Telemetry configuration (logging, metrics).
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl FaultlineConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use faultline_config::{FaultlineConfig, I18nSection};
    ///
    /// let config = FaultlineConfig::builder()
    ///     .i18n(I18nSection {
    ///         default_language: "fr".to_string(),
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.i18n.default_language, "fr");
    /// ```
    #[must_use]
    pub fn builder() -> FaultlineConfigBuilder {
        FaultlineConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The default language is empty
    /// - A header name is empty or contains whitespace
    /// - The generic message is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.i18n.default_language.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "i18n.default_language",
                "must not be empty",
            ));
        }

        for (field, name) in [
            ("headers.trace_id", &self.headers.trace_id),
            ("headers.user_id", &self.headers.user_id),
        ] {
            if name.is_empty() {
                return Err(ConfigError::invalid_value(field, "must not be empty"));
            }
            if name.chars().any(char::is_whitespace) {
                return Err(ConfigError::invalid_value(
                    field,
                    format!("invalid header name: {name:?}"),
                ));
            }
        }

        if self.exposure.generic_message.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "exposure.generic_message",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// This preset is optimized for local development with:
    /// - Development mode (strict catalog, full exposure)
    /// - Pretty log formatting with file and line
    /// - Debug log level
    ///
    /// # Example
    ///
    /// ```
    /// use faultline_config::FaultlineConfig;
    /// use faultline_core::ExecutionMode;
    ///
    /// let config = FaultlineConfig::development();
    /// assert_eq!(config.mode, ExecutionMode::Development);
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.mode = ExecutionMode::Development;

        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.json_format = false;
        config.telemetry.logging.include_location = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// This preset uses JSON logs at info level and turns on the error
    /// counter.
    ///
    /// # Example
    ///
    /// ```
    /// use faultline_config::FaultlineConfig;
    ///
    /// let config = FaultlineConfig::production();
    /// assert!(config.telemetry.logging.json_format);
    /// assert!(config.telemetry.metrics.enabled);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.mode = ExecutionMode::Production;

        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.json_format = true;
        config.telemetry.metrics.enabled = true;

        config
    }

    /// Returns the catalog registration policy for this configuration.
    #[must_use]
    pub fn registration_policy(&self) -> RegistrationPolicy {
        RegistrationPolicy {
            reject_duplicates: self.catalog.reject_duplicates,
            relaxed_key_format: self.catalog.relaxed_key_format,
            strict: self.mode.is_strict(),
        }
    }

    /// Returns the redaction policy for this configuration.
    #[must_use]
    pub fn exposure_policy(&self) -> ExposurePolicy {
        ExposurePolicy {
            generic_message: self.exposure.generic_message.clone(),
            meta: self.exposure.meta,
        }
    }
}

/// Builder for [`FaultlineConfig`].
#[derive(Debug, Default)]
pub struct FaultlineConfigBuilder {
    mode: Option<ExecutionMode>,
    catalog: Option<CatalogSection>,
    i18n: Option<I18nSection>,
    headers: Option<HeadersSection>,
    exposure: Option<ExposureSection>,
    telemetry: Option<TelemetrySection>,
}

impl FaultlineConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the execution mode.
    #[must_use]
    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the catalog configuration.
    #[must_use]
    pub fn catalog(mut self, catalog: CatalogSection) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Set the localization configuration.
    #[must_use]
    pub fn i18n(mut self, i18n: I18nSection) -> Self {
        self.i18n = Some(i18n);
        self
    }

    /// Set the header configuration.
    #[must_use]
    pub fn headers(mut self, headers: HeadersSection) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Set the exposure configuration.
    #[must_use]
    pub fn exposure(mut self, exposure: ExposureSection) -> Self {
        self.exposure = Some(exposure);
        self
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> FaultlineConfig {
        FaultlineConfig {
            mode: self.mode.unwrap_or_default(),
            catalog: self.catalog.unwrap_or_default(),
            i18n: self.i18n.unwrap_or_default(),
            headers: self.headers.unwrap_or_default(),
            exposure: self.exposure.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }
}
