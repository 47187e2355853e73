//! Assembling a ready-to-serve Faultline instance from configuration.

use std::sync::Arc;

use faultline_config::{
    ConfigError, ConfigLoader, DefinitionError, DefinitionLoader, FaultlineConfig,
    DEFAULT_ENV_PREFIX,
};
use faultline_core::{
    DefinitionCatalog, ErrorDefinition, ErrorObserver, ExecutionMode, LocalizationResolver,
    ObserverSet,
};
use faultline_middleware::stages::TraceContextMiddleware;
use faultline_middleware::{Pipeline, ResponseEmitter};
use faultline_telemetry::{LogConfig, MetricsConfig, MetricsObserver, TelemetryConfig, TelemetryError};
use thiserror::Error;

/// Errors that can occur while bootstrapping.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Error definitions could not be loaded or registered.
    #[error(transparent)]
    Definitions(#[from] DefinitionError),

    /// Telemetry could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// A configured header name is not a valid HTTP header name.
    #[error("invalid header name in configuration: {0}")]
    InvalidHeader(String),
}

/// The assembled error-handling stack: catalog, resolver, emitter and
/// pipeline, all shared by `Arc`.
///
/// # Example
///
/// ```
/// use faultline::{Faultline, FaultlineConfig};
/// use faultline_core::ErrorDefinition;
///
/// let faultline = Faultline::builder(FaultlineConfig::default())
///     .definition(ErrorDefinition::new("teapot", 418, "I'm a teapot").exposed())
///     .build()
///     .unwrap();
///
/// assert!(faultline.catalog().contains("teapot"));
/// assert_eq!(faultline.pipeline().stage_names(), vec!["trace_context", "panic_recovery"]);
/// ```
#[derive(Debug, Clone)]
pub struct Faultline {
    config: FaultlineConfig,
    catalog: Arc<DefinitionCatalog>,
    resolver: Arc<LocalizationResolver>,
    emitter: Arc<ResponseEmitter>,
    pipeline: Arc<Pipeline>,
}

impl Faultline {
    /// Builds everything from `config` alone.
    ///
    /// # Errors
    ///
    /// See [`FaultlineBuilder::build`].
    pub fn bootstrap(config: FaultlineConfig) -> Result<Self, BootstrapError> {
        Self::builder(config).build()
    }

    /// Loads configuration from `.env` and `FAULTLINE__*` variables, then
    /// bootstraps.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Config` if the environment holds invalid
    /// values, or any error from [`FaultlineBuilder::build`].
    pub fn from_env() -> Result<Self, BootstrapError> {
        let config = ConfigLoader::new()
            .with_dotenv()?
            .with_env_prefix(DEFAULT_ENV_PREFIX)
            .load()?;
        Self::bootstrap(config)
    }

    /// Starts a builder for injecting observers or definitions.
    #[must_use]
    pub fn builder(config: FaultlineConfig) -> FaultlineBuilder {
        FaultlineBuilder::new(config)
    }

    /// Returns the configuration this instance was built from.
    #[must_use]
    pub fn config(&self) -> &FaultlineConfig {
        &self.config
    }

    /// Returns the execution mode.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.config.mode
    }

    /// Returns the definition catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<DefinitionCatalog> {
        &self.catalog
    }

    /// Returns the localization resolver.
    #[must_use]
    pub fn resolver(&self) -> &Arc<LocalizationResolver> {
        &self.resolver
    }

    /// Returns the response emitter.
    #[must_use]
    pub fn emitter(&self) -> &Arc<ResponseEmitter> {
        &self.emitter
    }

    /// Returns the request-scope pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Returns the telemetry settings derived from the configuration.
    #[must_use]
    pub fn telemetry_config(&self) -> TelemetryConfig {
        telemetry_config(&self.config)
    }

    /// Installs the global logging subscriber and metrics recorder.
    ///
    /// Call once per process, before serving traffic.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Telemetry` if a global subscriber or
    /// recorder is already installed.
    pub fn init_telemetry(&self) -> Result<(), BootstrapError> {
        faultline_telemetry::init_telemetry(&self.telemetry_config())?;
        Ok(())
    }
}

/// Maps the configuration's telemetry section onto the telemetry crate's
/// settings, starting from the preset that matches the mode.
#[must_use]
pub fn telemetry_config(config: &FaultlineConfig) -> TelemetryConfig {
    let section = &config.telemetry;
    let base = match config.mode {
        ExecutionMode::Development => LogConfig::development(),
        ExecutionMode::Production => LogConfig::production(),
    };

    TelemetryConfig {
        logging: LogConfig {
            enabled: section.logging.enabled,
            level: section.logging.level.clone(),
            json_format: section.logging.json_format,
            file_line_info: section.logging.include_location,
            ..base
        },
        metrics: MetricsConfig {
            enabled: section.metrics.enabled,
        },
    }
}

/// Builder for [`Faultline`].
#[must_use]
pub struct FaultlineBuilder {
    config: FaultlineConfig,
    observers: ObserverSet,
    definitions: Vec<ErrorDefinition>,
}

impl FaultlineBuilder {
    /// Creates a builder for `config`.
    pub fn new(config: FaultlineConfig) -> Self {
        Self {
            config,
            observers: ObserverSet::new(),
            definitions: Vec::new(),
        }
    }

    /// Adds an error observer.
    pub fn observer(mut self, observer: impl ErrorObserver + 'static) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    /// Adds a definition, registered after the definitions file.
    pub fn definition(mut self, definition: ErrorDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Adds several definitions, registered after the definitions file.
    pub fn definitions<I>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = ErrorDefinition>,
    {
        self.definitions.extend(definitions);
        self
    }

    /// Assembles catalog, resolver, emitter and pipeline.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError` if:
    /// - The configuration does not validate
    /// - The definitions file is missing or malformed
    /// - A strict (development) catalog rejects a definition
    /// - A configured header name is invalid
    pub fn build(self) -> Result<Faultline, BootstrapError> {
        let Self {
            config,
            mut observers,
            definitions,
        } = self;

        config.validate()?;

        let catalog = Arc::new(DefinitionCatalog::with_policy(config.registration_policy()));
        if let Some(path) = &config.catalog.definitions_path {
            DefinitionLoader::from_path(path)?.load_into(&catalog)?;
        }
        catalog
            .register_all(definitions)
            .map_err(DefinitionError::from)?;

        let resolver = Arc::new(LocalizationResolver::with_default_language(
            Arc::clone(&catalog),
            config.i18n.default_language.clone(),
        ));

        if config.telemetry.metrics.enabled {
            observers.push(Arc::new(MetricsObserver));
        }

        let mut emitter = ResponseEmitter::new(Arc::clone(&resolver), config.mode)
            .with_exposure(config.exposure_policy());
        if !observers.is_empty() {
            emitter = emitter.with_observer(Arc::new(observers));
        }
        let emitter = Arc::new(emitter);

        let trace_context =
            TraceContextMiddleware::with_headers(&config.headers.trace_id, &config.headers.user_id)
                .map_err(|e| BootstrapError::InvalidHeader(e.to_string()))?
                .read_accept_language(config.headers.read_accept_language);

        let pipeline = Arc::new(
            Pipeline::builder(Arc::clone(&emitter))
                .trace_context(trace_context)
                .build(),
        );

        tracing::info!(
            mode = %config.mode,
            definitions = catalog.len(),
            "faultline ready"
        );

        Ok(Faultline {
            config,
            catalog,
            resolver,
            emitter,
            pipeline,
        })
    }
}

impl std::fmt::Debug for FaultlineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultlineBuilder")
            .field("config", &self.config)
            .field("observers", &self.observers)
            .field("definitions", &self.definitions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_config::MetricsSection;

    #[test]
    fn test_bootstrap_defaults() {
        let faultline = Faultline::bootstrap(FaultlineConfig::default()).unwrap();
        assert!(faultline.catalog().is_empty());
        assert_eq!(faultline.mode(), ExecutionMode::Production);
        assert_eq!(faultline.resolver().default_language(), "en");
    }

    #[test]
    fn test_custom_headers() {
        let mut config = FaultlineConfig::default();
        config.headers.trace_id = "X-Request-ID".to_string();
        assert!(Faultline::bootstrap(config).is_ok());
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut config = FaultlineConfig::default();
        config.headers.user_id = "X-User(ID)".to_string();
        let err = Faultline::bootstrap(config).unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidHeader(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = FaultlineConfig::default();
        config.i18n.default_language = String::new();
        let err = Faultline::bootstrap(config).unwrap_err();
        assert!(matches!(err, BootstrapError::Config(_)));
    }

    #[test]
    fn test_missing_definitions_file() {
        let mut config = FaultlineConfig::default();
        config.catalog.definitions_path = Some("/nonexistent/errors.yaml".into());
        let err = Faultline::bootstrap(config).unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Definitions(DefinitionError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_strict_duplicate_fails_startup() {
        let result = Faultline::builder(FaultlineConfig::development())
            .definition(ErrorDefinition::new("teapot", 418, "I'm a teapot"))
            .definition(ErrorDefinition::new("teapot", 500, "not a teapot"))
            .build();
        assert!(matches!(result, Err(BootstrapError::Definitions(_))));
    }

    #[test]
    fn test_production_duplicate_keeps_first() {
        let faultline = Faultline::builder(FaultlineConfig::default())
            .definition(ErrorDefinition::new("teapot", 418, "I'm a teapot"))
            .definition(ErrorDefinition::new("teapot", 500, "not a teapot"))
            .build()
            .unwrap();
        assert_eq!(faultline.catalog().lookup("teapot").unwrap().code, 418);
    }

    #[test]
    fn test_telemetry_config_mapping() {
        let mut config = FaultlineConfig::development();
        config.telemetry.metrics = MetricsSection { enabled: true };
        let telemetry = telemetry_config(&config);

        assert_eq!(telemetry.logging.level, "debug");
        assert!(!telemetry.logging.json_format);
        assert!(telemetry.logging.file_line_info);
        assert!(telemetry.logging.span_events);
        assert!(telemetry.metrics.enabled);
    }
}
