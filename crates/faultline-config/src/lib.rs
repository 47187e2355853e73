//! # Faultline Config
//!
//! Typed configuration and error definition loading for Faultline.
//!
//! ## Configuration
//!
//! [`ConfigLoader`] layers defaults, a TOML or JSON file, and environment
//! variables into a validated [`FaultlineConfig`]:
//!
//! ```no_run
//! use faultline_config::{ConfigLoader, DEFAULT_ENV_PREFIX};
//!
//! # fn main() -> Result<(), faultline_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("faultline.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix(DEFAULT_ENV_PREFIX)
//!     .load()?;
//! # Ok(())
//! # }
//! ```
//!
//! Environment variables use double underscores between levels:
//!
//! | Variable | Field |
//! |---|---|
//! | `FAULTLINE__MODE` | `mode` |
//! | `FAULTLINE__CATALOG__DEFINITIONS_PATH` | `catalog.definitions_path` |
//! | `FAULTLINE__I18N__DEFAULT_LANGUAGE` | `i18n.default_language` |
//! | `FAULTLINE__HEADERS__TRACE_ID` | `headers.trace_id` |
//! | `FAULTLINE__EXPOSURE__META` | `exposure.meta` |
//! | `FAULTLINE__TELEMETRY__LOGGING__LEVEL` | `telemetry.logging.level` |
//!
//! `APP_ENV` selects the mode when `FAULTLINE__MODE` is not set.
//!
//! ## Error definitions
//!
//! [`DefinitionLoader`] reads the YAML definition list and registers it into
//! a [`DefinitionCatalog`](faultline_core::DefinitionCatalog).

#![doc(html_root_url = "https://docs.rs/faultline-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod definitions;
mod error;
mod loader;
mod schema;

pub use config::{FaultlineConfig, FaultlineConfigBuilder};
pub use definitions::DefinitionLoader;
pub use error::{ConfigError, DefinitionError};
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{
    CatalogSection, ExposureSection, HeadersSection, I18nSection, LoggingSection, MetricsSection,
    TelemetrySection,
};
