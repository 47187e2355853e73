//! # Faultline Core
//!
//! Core types for the Faultline error-handling toolkit.
//!
//! - [`ErrorDefinition`] / [`DefinitionCatalog`] - the registry of known error kinds
//! - [`LocalizationResolver`] - cached exact → base → default text resolution
//! - [`ApiError`] - the structured runtime error with constructors per kind
//! - [`Envelope`] - the JSON wire shape for success and failure
//! - [`RequestContext`] - the trace/user/language scope an error is emitted in
//! - [`ExposurePolicy`] - what redacted errors may reveal
//! - [`ErrorObserver`] - hook notified of each emitted error
//! - [`ExecutionMode`] - production vs development behaviour

#![doc(html_root_url = "https://docs.rs/faultline-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod definition;
mod envelope;
mod error;
mod exposure;
mod i18n;
mod mode;
mod observer;

pub use context::RequestContext;
pub use definition::{
    is_valid_key, CatalogError, DefinitionCatalog, ErrorDefinition, Registration,
    RegistrationPolicy,
};
pub use envelope::{Envelope, ErrorBody};
pub use error::{
    find_api_error, is_key, keys, normalize, ApiError, ApiResult, Metadata, GENERIC_MESSAGE,
};
pub use exposure::{ExposurePolicy, MetaVisibility};
pub use i18n::{LocalizationResolver, DEFAULT_LANGUAGE};
pub use mode::{ExecutionMode, APP_ENV_VAR};
pub use observer::{ErrorObserver, ObserverSet};
