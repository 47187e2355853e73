//! # Faultline
//!
//! **Structured, localized API errors with panic-safe request handling**
//!
//! Faultline gives an HTTP service one consistent way to fail:
//!
//! - **Definition catalog** – every error kind has a key, a status, a default
//!   message and translations, loaded from YAML or registered in code
//! - **Structured errors** – [`ApiError`](faultline_core::ApiError) carries
//!   status, key, metadata, trace context and a log-only cause
//! - **Envelope responses** – `{"success": false, "error": {...}}` with
//!   localized messages and redaction of internal detail
//! - **Panic recovery** – a handler panic becomes a normal 500 response
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use faultline::prelude::*;
//!
//! let faultline = Faultline::from_env()?;
//! faultline.init_telemetry()?;
//!
//! let response = faultline
//!     .pipeline()
//!     .handle(request, move |ctx, _request| {
//!         let scope = ctx.to_request_context();
//!         let emitter = Arc::clone(faultline.emitter());
//!         Box::pin(async move {
//!             emitter.respond::<(), _>(&scope, Err(ApiError::not_found("user_not_found", "no user")))
//!         })
//!     })
//!     .await;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → TraceContext → PanicRecovery → Handler
//!                                            ↓
//! Response ← ResponseEmitter (envelope) ←────┘
//! ```

#![doc(html_root_url = "https://docs.rs/faultline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bootstrap;

pub use bootstrap::{telemetry_config, BootstrapError, Faultline, FaultlineBuilder};
pub use faultline_config::FaultlineConfig;

// Re-export core types
pub use faultline_core as core;

// Re-export middleware types
pub use faultline_middleware as middleware;

// Re-export configuration types
pub use faultline_config as config;

// Re-export telemetry types
pub use faultline_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use faultline::prelude::*;
///
/// let err = ApiError::bad_request("invalid_input", "name is required");
/// assert_eq!(err.code(), 400);
/// ```
pub mod prelude {
    pub use crate::{BootstrapError, Faultline, FaultlineBuilder, FaultlineConfig};

    pub use faultline_core::{
        find_api_error, is_key, normalize, ApiError, ApiResult, DefinitionCatalog,
        ErrorDefinition, ErrorObserver, ExecutionMode, LocalizationResolver, Metadata,
        RequestContext,
    };

    pub use faultline_middleware::{MiddlewareContext, Pipeline, ResponseEmitter};

    pub use faultline_config::{ConfigLoader, DefinitionLoader};
}
