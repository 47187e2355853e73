//! Per-request error scope.

use crate::i18n::DEFAULT_LANGUAGE;

/// Request-scoped values an error picks up when it is emitted.
///
/// # Example
///
/// ```
/// use faultline_core::RequestContext;
///
/// let ctx = RequestContext::new()
///     .with_trace_id("abc")
///     .with_user_id("123")
///     .with_language("fr");
/// assert_eq!(ctx.trace_id(), "abc");
/// assert_eq!(ctx.language(), "fr");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    trace_id: String,
    user_id: String,
    language: String,
}

impl RequestContext {
    /// Creates an empty scope using the default language.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trace_id: String::new(),
            user_id: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Sets the trace id.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    /// Sets the user id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Sets the response language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Returns the trace id (empty if absent).
    #[must_use]
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Returns the user id (empty if absent).
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns the response language.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
