//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use faultline_core::{MetaVisibility, GENERIC_MESSAGE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Definition catalog section.
///
/// Controls how duplicate and malformed keys are treated at registration
/// time and where the definitions file lives.
///
/// # Example
///
/// ```
/// use faultline_config::CatalogSection;
///
/// let section = CatalogSection {
///     reject_duplicates: true,
///     relaxed_key_format: false,
///     definitions_path: Some("errors.yaml".into()),
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CatalogSection {
    /// Keep the first definition when a key is registered twice.
    #[serde(default = "default_true")]
    pub reject_duplicates: bool,

    /// Accept keys outside `[a-z0-9_.-]` without complaint.
    #[serde(default = "default_true")]
    pub relaxed_key_format: bool,

    /// YAML file with error definitions, loaded at bootstrap.
    #[serde(default)]
    pub definitions_path: Option<PathBuf>,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            reject_duplicates: true,
            relaxed_key_format: true,
            definitions_path: None,
        }
    }
}

/// Localization section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct I18nSection {
    /// Language used when a request carries none.
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for I18nSection {
    fn default() -> Self {
        Self {
            default_language: default_language(),
        }
    }
}

fn default_language() -> String {
    faultline_core::DEFAULT_LANGUAGE.to_string()
}

/// Inbound header names read by the trace-context stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HeadersSection {
    /// Header carrying the trace identifier.
    #[serde(default = "default_trace_header")]
    pub trace_id: String,

    /// Header carrying the user identifier.
    #[serde(default = "default_user_header")]
    pub user_id: String,

    /// Derive the request language from `Accept-Language`.
    #[serde(default)]
    pub read_accept_language: bool,
}

impl Default for HeadersSection {
    fn default() -> Self {
        Self {
            trace_id: default_trace_header(),
            user_id: default_user_header(),
            read_accept_language: false,
        }
    }
}

fn default_trace_header() -> String {
    "X-Trace-ID".to_string()
}

fn default_user_header() -> String {
    "X-User-ID".to_string()
}

/// What a caller sees when an error is not exposed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExposureSection {
    /// Message substituted for redacted errors.
    #[serde(default = "default_generic_message")]
    pub generic_message: String,

    /// Whether metadata survives redaction.
    #[serde(default)]
    pub meta: MetaVisibility,
}

impl Default for ExposureSection {
    fn default() -> Self {
        Self {
            generic_message: default_generic_message(),
            meta: MetaVisibility::default(),
        }
    }
}

fn default_generic_message() -> String {
    GENERIC_MESSAGE.to_string()
}

/// Telemetry section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsSection,
}

/// Logging configuration.
///
/// # Example
///
/// ```
/// use faultline_config::LoggingSection;
///
/// let logging = LoggingSection {
///     enabled: true,
///     level: "debug".to_string(),
///     json_format: false,
///     include_location: true,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Install a subscriber at bootstrap.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level filter (e.g. "info", "faultline=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of pretty output.
    #[serde(default = "default_true")]
    pub json_format: bool,

    /// Include file and line in each event.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            json_format: true,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Install the Prometheus recorder and count emitted errors.
    #[serde(default)]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}
