//! Response emitter.
//!
//! [`ResponseEmitter`] is the single place where an outcome becomes a wire
//! response. For a failure it:
//!
//! 1. normalizes the error into an [`ApiError`] and applies the request language
//! 2. decides exposure (`expose` flag of the definition, or development mode)
//! 3. renders the envelope, substituting `internal_error` and the generic
//!    message when the error is not exposed
//! 4. logs one structured event and notifies the observer
//!
//! The HTTP status is always the error's own code, exposed or not.

use crate::panic_capture;
use crate::types::{Response, ResponseExt};
use faultline_core::{
    keys, normalize, ApiError, DefinitionCatalog, Envelope, ErrorBody, ErrorObserver,
    ExecutionMode, ExposurePolicy, LocalizationResolver, Metadata, RequestContext,
};
use http::StatusCode;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Body written if an envelope itself cannot be serialized.
const FALLBACK_BODY: &str =
    r#"{"success":false,"error":{"id":"internal_error","message":"unexpected server error"}}"#;

/// Turns handler outcomes into envelope responses.
///
/// # Example
///
/// ```
/// use faultline_core::{ApiError, DefinitionCatalog, ErrorDefinition, ExecutionMode, LocalizationResolver};
/// use faultline_middleware::ResponseEmitter;
/// use std::sync::Arc;
///
/// let catalog = Arc::new(DefinitionCatalog::new());
/// catalog
///     .register("teapot", ErrorDefinition::new("teapot", 418, "I'm a teapot").exposed())
///     .unwrap();
/// let emitter = ResponseEmitter::new(
///     Arc::new(LocalizationResolver::new(catalog)),
///     ExecutionMode::Production,
/// );
///
/// let response = emitter.emit::<(), _>(Err(ApiError::new(418, "teapot", "raw")), "en");
/// assert_eq!(response.status().as_u16(), 418);
/// ```
#[derive(Clone)]
pub struct ResponseEmitter {
    resolver: Arc<LocalizationResolver>,
    mode: ExecutionMode,
    exposure: ExposurePolicy,
    observer: Option<Arc<dyn ErrorObserver>>,
}

impl ResponseEmitter {
    /// Creates an emitter with the default exposure policy and no observer.
    #[must_use]
    pub fn new(resolver: Arc<LocalizationResolver>, mode: ExecutionMode) -> Self {
        Self {
            resolver,
            mode,
            exposure: ExposurePolicy::default(),
            observer: None,
        }
    }

    /// Sets the exposure policy.
    #[must_use]
    pub fn with_exposure(mut self, exposure: ExposurePolicy) -> Self {
        self.exposure = exposure;
        self
    }

    /// Registers the error observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ErrorObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the catalog used for exposure decisions.
    #[must_use]
    pub fn catalog(&self) -> &Arc<DefinitionCatalog> {
        self.resolver.catalog()
    }

    /// Returns the execution mode.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Returns the exposure policy.
    #[must_use]
    pub fn exposure(&self) -> &ExposurePolicy {
        &self.exposure
    }

    /// Returns `true` if an error with `key` is shown to callers as-is.
    #[must_use]
    pub fn is_exposed(&self, key: &str) -> bool {
        self.mode.is_permissive() || self.catalog().is_exposed(key)
    }

    /// Emits the response for `outcome` in `language`.
    pub fn emit<T, E>(&self, outcome: Result<T, E>, language: &str) -> Response
    where
        T: Serialize,
        E: Into<anyhow::Error>,
    {
        match outcome {
            Ok(data) => self.emit_success(&data, language),
            Err(err) => self.emit_error(prepare(err.into(), language)),
        }
    }

    /// Emits the response for `outcome` within a request scope.
    ///
    /// The scope's language always applies. Its trace and user ids apply
    /// when the error does not already carry its own.
    pub fn respond<T, E>(&self, scope: &RequestContext, outcome: Result<T, E>) -> Response
    where
        T: Serialize,
        E: Into<anyhow::Error>,
    {
        match outcome {
            Ok(data) => self.emit_success(&data, scope.language()),
            Err(err) => {
                let mut err = prepare(err.into(), scope.language());
                if err.trace_id().is_empty() && err.user_id().is_empty() {
                    err.set_trace(scope.trace_id(), scope.user_id());
                }
                self.emit_error(err)
            }
        }
    }

    /// Emits an already structured error in its own language.
    pub fn emit_error(&self, err: ApiError) -> Response {
        let (status, envelope) = self.render(&err, err.language());

        let response = match envelope.to_vec() {
            Ok(body) => Response::json(status, body),
            Err(serialize_err) => {
                tracing::error!(error = %serialize_err, "failed to serialize error envelope");
                Response::json(StatusCode::INTERNAL_SERVER_ERROR, FALLBACK_BODY)
            }
        };

        log_error(&err, status);
        self.notify(&err);
        response
    }

    /// Decides the status and envelope for `err` without side effects.
    pub fn render(&self, err: &ApiError, language: &str) -> (StatusCode, Envelope) {
        let exposed = self.is_exposed(err.key());

        let (id, message) = if exposed {
            let message = self
                .resolver
                .resolve(err.key(), language)
                .unwrap_or_else(|| err.message().to_string());
            (err.key().to_string(), message)
        } else {
            (
                keys::INTERNAL_ERROR.to_string(),
                self.exposure.generic_message.clone(),
            )
        };

        let meta = if self.exposure.meta.allows(exposed) {
            err.meta().clone()
        } else {
            Metadata::new()
        };

        let body = ErrorBody::new(id, message, meta, err.trace_id(), err.user_id());
        (err.status_code(), Envelope::failure(body))
    }

    fn emit_success<T: Serialize>(&self, data: &T, language: &str) -> Response {
        let body = serde_json::to_value(data).and_then(|data| Envelope::success(data).to_vec());
        match body {
            Ok(body) => Response::json(StatusCode::OK, body),
            Err(err) => self.emit_error(ApiError::internal(err, None).with_language(language)),
        }
    }

    fn notify(&self, err: &ApiError) {
        let Some(observer) = &self.observer else {
            return;
        };

        let observed = catch_unwind(AssertUnwindSafe(|| {
            observer.observe(err.key(), err.code());
        }));
        if observed.is_err() {
            let report = panic_capture::take_report().map(|report| report.to_string());
            tracing::error!(
                error_key = %err.key(),
                panic = report.as_deref(),
                "error observer panicked"
            );
        }
    }
}

impl std::fmt::Debug for ResponseEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseEmitter")
            .field("mode", &self.mode)
            .field("exposure", &self.exposure)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

fn prepare(err: anyhow::Error, language: &str) -> ApiError {
    let mut err = normalize(err);
    err.set_language(language);
    err
}

fn log_error(err: &ApiError, status: StatusCode) {
    let meta = serde_json::Value::Object(err.meta().clone());
    let cause = err.cause().map(|cause| format!("{cause:#}"));

    if status.is_server_error() {
        tracing::error!(
            error_key = %err.key(),
            status = status.as_u16(),
            trace_id = %err.trace_id(),
            user_id = %err.user_id(),
            meta = %meta,
            cause = cause.as_deref(),
            "{}",
            err.message()
        );
    } else {
        tracing::warn!(
            error_key = %err.key(),
            status = status.as_u16(),
            trace_id = %err.trace_id(),
            user_id = %err.user_id(),
            meta = %meta,
            cause = cause.as_deref(),
            "{}",
            err.message()
        );
    }
}
