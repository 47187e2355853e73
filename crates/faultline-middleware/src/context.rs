//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries request-scope state through the
//! pipeline. Once a handler needs it, it is converted to the immutable
//! [`RequestContext`] the response emitter consumes.

use faultline_core::{RequestContext, DEFAULT_LANGUAGE};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use faultline_middleware::MiddlewareContext;
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_trace_id("abc".to_string());
/// ctx.set_user_id("123".to_string());
///
/// let scope = ctx.to_request_context();
/// assert_eq!(scope.trace_id(), "abc");
/// assert_eq!(scope.user_id(), "123");
/// assert_eq!(scope.language(), "en");
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    /// Correlation id from the inbound request (empty if absent).
    trace_id: String,

    /// Caller id from the inbound request (empty if absent).
    user_id: String,

    /// Response language.
    language: String,

    /// When the request started processing.
    started_at: Instant,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates an empty context using the default language.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trace_id: String::new(),
            user_id: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the trace id (empty if absent).
    #[must_use]
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Sets the trace id.
    pub fn set_trace_id(&mut self, trace_id: String) {
        self.trace_id = trace_id;
    }

    /// Returns the user id (empty if absent).
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Sets the user id.
    pub fn set_user_id(&mut self, user_id: String) {
        self.user_id = user_id;
    }

    /// Returns the response language.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Sets the response language.
    pub fn set_language(&mut self, language: String) {
        self.language = language;
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    ///
    /// ```
    /// use faultline_middleware::MiddlewareContext;
    ///
    /// struct Tenant(&'static str);
    ///
    /// let mut ctx = MiddlewareContext::new();
    /// ctx.set_extension(Tenant("acme"));
    /// assert_eq!(ctx.get_extension::<Tenant>().unwrap().0, "acme");
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Snapshots the request scope for the response emitter.
    #[must_use]
    pub fn to_request_context(&self) -> RequestContext {
        RequestContext::new()
            .with_trace_id(self.trace_id.clone())
            .with_user_id(self.user_id.clone())
            .with_language(self.language.clone())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MiddlewareContext {
    fn clone(&self) -> Self {
        // Extensions are not cloned
        Self {
            trace_id: self.trace_id.clone(),
            user_id: self.user_id.clone(),
            language: self.language.clone(),
            started_at: self.started_at,
            extensions: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_empty() {
        let ctx = MiddlewareContext::new();
        assert!(ctx.trace_id().is_empty());
        assert!(ctx.user_id().is_empty());
        assert_eq!(ctx.language(), DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Marker(u32);

        let mut ctx = MiddlewareContext::new();
        assert!(ctx.get_extension::<Marker>().is_none());

        ctx.set_extension(Marker(7));
        assert_eq!(ctx.get_extension::<Marker>(), Some(&Marker(7)));

        assert_eq!(ctx.remove_extension::<Marker>(), Some(Marker(7)));
        assert!(ctx.get_extension::<Marker>().is_none());
    }

    #[test]
    fn test_clone_drops_extensions() {
        let mut ctx = MiddlewareContext::new();
        ctx.set_trace_id("t".to_string());
        ctx.set_extension(1_u8);

        let cloned = ctx.clone();
        assert_eq!(cloned.trace_id(), "t");
        assert!(cloned.get_extension::<u8>().is_none());
    }

    #[test]
    fn test_clone_keeps_start_time() {
        let ctx = MiddlewareContext::new();
        std::thread::sleep(Duration::from_millis(5));
        let before = ctx.elapsed();

        let cloned = ctx.clone();
        assert!(before >= Duration::from_millis(5));
        assert!(cloned.elapsed() >= before);
    }

    #[test]
    fn test_to_request_context() {
        let mut ctx = MiddlewareContext::new();
        ctx.set_language("fr-CA".to_string());
        let scope = ctx.to_request_context();
        assert_eq!(scope.language(), "fr-CA");
        assert!(scope.trace_id().is_empty());
    }
}
