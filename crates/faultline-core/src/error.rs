//! The structured error type.
//!
//! [`ApiError`] is the single runtime representation of a failure. All error
//! kinds share it; they only differ in the helper that builds them:
//!
//! | Helper | Status | Key |
//! |---|---|---|
//! | [`ApiError::bad_request`] | 400 | caller-supplied |
//! | [`ApiError::validation`] | 400 | `validation_error` |
//! | [`ApiError::unauthorized`] | 401 | `unauthorized` |
//! | [`ApiError::forbidden`] | 403 | `forbidden` |
//! | [`ApiError::not_found`] | 404 | caller-supplied |
//! | [`ApiError::internal`] | 500 | `internal_error` |
//! | [`ApiError::unknown`] | 500 | `unknown_error` |
//!
//! The wrapped cause is reachable through [`std::error::Error::source`] for
//! diagnostics and logs, but it is never serialized.

use crate::i18n::{LocalizationResolver, DEFAULT_LANGUAGE};
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;

/// Free-form metadata attached to an error.
pub type Metadata = serde_json::Map<String, Value>;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Well-known error keys.
pub mod keys {
    /// Generic client input fault raised by validation helpers.
    pub const VALIDATION_ERROR: &str = "validation_error";
    /// Missing or invalid credentials.
    pub const UNAUTHORIZED: &str = "unauthorized";
    /// Authenticated caller lacks permission.
    pub const FORBIDDEN: &str = "forbidden";
    /// Server-side failure; also the redacted identity of hidden errors.
    pub const INTERNAL_ERROR: &str = "internal_error";
    /// A non-structured error reached the response path.
    pub const UNKNOWN_ERROR: &str = "unknown_error";
}

/// Message used for [`ApiError::unknown`] and redacted responses.
pub const GENERIC_MESSAGE: &str = "unexpected server error";

/// A structured, localizable error.
///
/// # Example
///
/// ```
/// use faultline_core::ApiError;
///
/// let mut err = ApiError::not_found("user_not_found", "User not found")
///     .with_trace("trace-1", "user-7");
/// err.add_meta("user_id", 7);
///
/// assert_eq!(err.code(), 404);
/// assert_eq!(err.key(), "user_not_found");
/// assert_eq!(err.meta_value("user_id"), Some(&serde_json::json!(7)));
/// assert_eq!(err.to_string(), "[404] user_not_found: User not found");
/// ```
#[derive(Debug)]
pub struct ApiError {
    code: u16,
    key: String,
    message: String,
    language: String,
    cause: Option<anyhow::Error>,
    meta: Metadata,
    trace_id: String,
    user_id: String,
    group: Option<String>,
}

impl ApiError {
    /// Creates an error with an arbitrary status code and key.
    #[must_use]
    pub fn new(code: u16, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            key: key.into(),
            message: message.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            cause: None,
            meta: Metadata::new(),
            trace_id: String::new(),
            user_id: String::new(),
            group: None,
        }
    }

    /// Creates a 400 error for a generic client input fault.
    #[must_use]
    pub fn bad_request(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST.as_u16(), key, message)
    }

    /// Creates a 400 `validation_error` carrying a field → message mapping
    /// under the `fields` metadata key.
    ///
    /// ```
    /// use faultline_core::ApiError;
    ///
    /// let err = ApiError::validation([("email", "required")]);
    /// assert_eq!(err.code(), 400);
    /// assert_eq!(err.meta_value("fields"), Some(&serde_json::json!({"email": "required"})));
    /// ```
    #[must_use]
    pub fn validation<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields: Metadata = fields
            .into_iter()
            .map(|(field, message)| (field.into(), Value::String(message.into())))
            .collect();

        let mut err = Self::new(
            StatusCode::BAD_REQUEST.as_u16(),
            keys::VALIDATION_ERROR,
            "validation failed",
        );
        err.add_meta("fields", Value::Object(fields));
        err
    }

    /// Creates a 404 error.
    #[must_use]
    pub fn not_found(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND.as_u16(), key, message)
    }

    /// Creates a 401 `unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED.as_u16(), keys::UNAUTHORIZED, message)
    }

    /// Creates a 403 `forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN.as_u16(), keys::FORBIDDEN, message)
    }

    /// Creates a 500 `internal_error` wrapping `cause`.
    pub fn internal(cause: impl Into<anyhow::Error>, meta: Option<Metadata>) -> Self {
        let err = Self::new(
            StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            keys::INTERNAL_ERROR,
            "internal server error",
        )
        .with_cause(cause);
        match meta {
            Some(meta) => err.with_meta(meta),
            None => err,
        }
    }

    /// Creates a 500 `unknown_error` for a failure that was not classified.
    pub fn unknown(cause: impl Into<anyhow::Error>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            keys::UNKNOWN_ERROR,
            GENERIC_MESSAGE,
        )
        .with_cause(cause)
    }

    /// Sets the language used for localization.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the wrapped cause.
    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Replaces the metadata map.
    #[must_use]
    pub fn with_meta(mut self, meta: Metadata) -> Self {
        self.meta = meta;
        self
    }

    /// Sets the group tag.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Attaches request-scope identifiers.
    #[must_use]
    pub fn with_trace(mut self, trace_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.set_trace(trace_id, user_id);
        self
    }

    /// Attaches request-scope identifiers in place.
    pub fn set_trace(&mut self, trace_id: impl Into<String>, user_id: impl Into<String>) {
        self.trace_id = trace_id.into();
        self.user_id = user_id.into();
    }

    /// Overwrites the language in place.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    /// Adds a metadata entry; the last write for a key wins.
    pub fn add_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.meta.insert(key.into(), value.into());
    }

    /// Returns a metadata entry.
    #[must_use]
    pub fn meta_value(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Returns the whole metadata map.
    #[must_use]
    pub fn meta(&self) -> &Metadata {
        &self.meta
    }

    /// Returns the HTTP status code as a number.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Returns the HTTP status, falling back to 500 for codes outside the
    /// valid range.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns the error key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the caller-supplied message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the localization language.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Returns the wrapped cause.
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }

    /// Returns the trace id (empty if unset).
    #[must_use]
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Returns the user id (empty if unset).
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns the group tag.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Returns the localized message, or the error's own message when the
    /// key is unknown to the catalog.
    pub fn localized(&self, resolver: &LocalizationResolver) -> String {
        resolver
            .resolve(&self.key, &self.language)
            .unwrap_or_else(|| self.message.clone())
    }

    /// Copies every field except the cause.
    fn detached(&self) -> Self {
        Self {
            code: self.code,
            key: self.key.clone(),
            message: self.message.clone(),
            language: self.language.clone(),
            cause: None,
            meta: self.meta.clone(),
            trace_id: self.trace_id.clone(),
            user_id: self.user_id.clone(),
            group: self.group.clone(),
        }
    }

    /// Serializes the wire-safe subset of the error as JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        let view = WireError {
            id: &self.key,
            message: &self.message,
            meta: (!self.meta.is_empty()).then_some(&self.meta),
            trace_id: non_empty(&self.trace_id),
            user_id: non_empty(&self.user_id),
            group: self.group.as_deref(),
        };
        serde_json::to_string(&view).unwrap_or_default()
    }
}

#[derive(Serialize)]
struct WireError<'a> {
    id: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<&'a Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.key, self.message)
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(|cause| {
            let source: &(dyn StdError + 'static) = &**cause;
            source
        })
    }
}

/// Returns the first [`ApiError`] in `err`'s source chain, including `err`
/// itself.
///
/// ```
/// use faultline_core::{find_api_error, ApiError};
///
/// let err = ApiError::internal(std::io::Error::other("disk full"), None);
/// let found = find_api_error(&err).unwrap();
/// assert_eq!(found.key(), "internal_error");
/// assert_eq!(found.cause().unwrap().to_string(), "disk full");
/// ```
pub fn find_api_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a ApiError> {
    chain(err).find_map(|e| e.downcast_ref::<ApiError>())
}

/// Returns `true` if any [`ApiError`] in `err`'s source chain has `key`.
///
/// ```
/// use faultline_core::{is_key, ApiError};
///
/// let missing = ApiError::not_found("user_not_found", "User not found");
/// let wrapped = ApiError::internal(missing, None);
///
/// assert!(is_key(&wrapped, "internal_error"));
/// assert!(is_key(&wrapped, "user_not_found"));
/// assert!(!is_key(&wrapped, "forbidden"));
/// ```
pub fn is_key(err: &(dyn StdError + 'static), key: &str) -> bool {
    chain(err)
        .filter_map(|e| e.downcast_ref::<ApiError>())
        .any(|api| api.key == key)
}

fn chain<'a>(
    err: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |&e| e.source())
}

/// Converts an arbitrary failure into an [`ApiError`].
///
/// A top-level `ApiError` is returned as-is. An `ApiError` found deeper in
/// the chain is copied, keeping the original failure as its cause. Anything
/// else becomes [`ApiError::unknown`].
pub fn normalize(err: anyhow::Error) -> ApiError {
    match err.downcast::<ApiError>() {
        Ok(api) => api,
        Err(err) => match find_api_error(&*err).map(ApiError::detached) {
            Some(api) => api.with_cause(err),
            None => ApiError::unknown(err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Wrapper(ApiError);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "wrapped: {}", self.0)
        }
    }

    impl StdError for Wrapper {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_bad_request_basics() {
        let err = ApiError::bad_request("bad_input", "Invalid input");
        assert_eq!(err.code(), 400);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.key(), "bad_input");
        assert!(err.to_string().contains("Invalid input"));
        assert_eq!(err.language(), DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_constructor_taxonomy() {
        let cases = [
            (ApiError::unauthorized("login"), 401, keys::UNAUTHORIZED),
            (ApiError::forbidden("nope"), 403, keys::FORBIDDEN),
            (ApiError::not_found("user_not_found", "gone"), 404, "user_not_found"),
            (
                ApiError::internal(anyhow::anyhow!("boom"), None),
                500,
                keys::INTERNAL_ERROR,
            ),
            (
                ApiError::unknown(anyhow::anyhow!("boom")),
                500,
                keys::UNKNOWN_ERROR,
            ),
        ];

        for (err, code, key) in cases {
            assert_eq!(err.code(), code, "{err}");
            assert_eq!(err.key(), key);
        }
    }

    #[test]
    fn test_meta_last_write_wins() {
        let mut err = ApiError::bad_request("bad_input", "Invalid input");
        assert!(err.meta_value("field").is_none());

        err.add_meta("field", "email");
        err.add_meta("field", "name");
        err.add_meta("attempts", 3);

        assert_eq!(err.meta_value("field"), Some(&json!("name")));
        assert_eq!(err.meta_value("attempts"), Some(&json!(3)));
        assert_eq!(err.meta().len(), 2);
    }

    #[test]
    fn test_validation_fields() {
        let err = ApiError::validation([("email", "required")]);
        assert_eq!(err.code(), 400);
        assert_eq!(err.key(), keys::VALIDATION_ERROR);
        assert_eq!(err.message(), "validation failed");
        assert_eq!(err.meta_value("fields"), Some(&json!({"email": "required"})));
    }

    #[test]
    fn test_internal_with_meta() {
        let mut meta = Metadata::new();
        meta.insert("query".to_string(), json!("select 1"));
        let err = ApiError::internal(anyhow::anyhow!("db down"), Some(meta));
        assert_eq!(err.meta_value("query"), Some(&json!("select 1")));
    }

    #[test]
    fn test_internal_cause_is_reachable() {
        let err = ApiError::internal(std::io::Error::other("some native error"), None);

        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "some native error");

        let found = find_api_error(&err).unwrap();
        assert_eq!(found.key(), keys::INTERNAL_ERROR);
        assert_eq!(found.cause().unwrap().to_string(), "some native error");
    }

    #[test]
    fn test_is_key_walks_chain() {
        let err = Wrapper(ApiError::not_found("user_not_found", "User not found"));
        assert!(is_key(&err, "user_not_found"));
        assert!(!is_key(&err, "internal_error"));

        let plain = std::io::Error::other("plain");
        assert!(!is_key(&plain, "user_not_found"));
        assert!(find_api_error(&plain).is_none());
    }

    #[test]
    fn test_chain_reaches_nested_cause() {
        let inner = ApiError::not_found("user_not_found", "User not found");
        let err = Wrapper(ApiError::internal(inner, None));

        assert_eq!(chain(&err).count(), 3);
        assert!(is_key(&err, "internal_error"));
        assert!(is_key(&err, "user_not_found"));
        assert_eq!(find_api_error(&err).unwrap().key(), keys::INTERNAL_ERROR);
    }

    #[test]
    fn test_with_trace() {
        let err = ApiError::forbidden("no").with_trace("abc", "123");
        assert_eq!(err.trace_id(), "abc");
        assert_eq!(err.user_id(), "123");
    }

    #[test]
    fn test_status_code_fallback() {
        assert_eq!(
            ApiError::new(42, "weird", "odd").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::new(418, "teapot", "t").status_code().as_u16(), 418);
    }

    #[test]
    fn test_to_json_hides_cause() {
        let err = ApiError::internal(anyhow::anyhow!("secret path /etc/shadow"), None)
            .with_trace("t-1", "")
            .with_group("storage");
        let json: Value = serde_json::from_str(&err.to_json()).unwrap();

        assert_eq!(json["id"], "internal_error");
        assert_eq!(json["trace_id"], "t-1");
        assert_eq!(json["group"], "storage");
        assert!(json.get("user_id").is_none());
        assert!(json.get("meta").is_none());
        assert!(!err.to_json().contains("shadow"));
    }

    #[test]
    fn test_localized_falls_back_to_message() {
        let catalog = Arc::new(crate::DefinitionCatalog::new());
        catalog
            .register(
                "teapot",
                crate::ErrorDefinition::new("teapot", 418, "I'm a teapot")
                    .with_translation("fr", "Je suis une théière"),
            )
            .unwrap();
        let resolver = LocalizationResolver::new(catalog);

        let missing = ApiError::bad_request("non_existing_key", "fallback message");
        assert_eq!(missing.localized(&resolver), "fallback message");

        let teapot = ApiError::new(418, "teapot", "raw").with_language("fr");
        assert_eq!(teapot.localized(&resolver), "Je suis une théière");
    }

    #[test]
    fn test_normalize_reuses_top_level() {
        let err = normalize(ApiError::forbidden("no").with_trace("t", "u").into());
        assert_eq!(err.key(), keys::FORBIDDEN);
        assert_eq!(err.trace_id(), "t");
        assert!(err.cause().is_none());
    }

    #[test]
    fn test_normalize_copies_nested() {
        let wrapped = Wrapper(ApiError::not_found("user_not_found", "User not found"));
        let err = normalize(anyhow::Error::new(wrapped));

        assert_eq!(err.key(), "user_not_found");
        assert_eq!(err.code(), 404);
        assert!(err.cause().unwrap().to_string().contains("wrapped"));
    }

    #[test]
    fn test_normalize_demotes_foreign_errors() {
        let err = normalize(anyhow::anyhow!("socket closed"));
        assert_eq!(err.key(), keys::UNKNOWN_ERROR);
        assert_eq!(err.code(), 500);
        assert_eq!(err.message(), GENERIC_MESSAGE);
        assert_eq!(err.cause().unwrap().to_string(), "socket closed");
    }
}
