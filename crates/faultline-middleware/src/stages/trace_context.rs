//! Trace context middleware.
//!
//! Copies the caller-supplied correlation headers into the
//! [`MiddlewareContext`] so every error emitted later in the request carries
//! them:
//!
//! - `X-Trace-ID` → trace id
//! - `X-User-ID` → user id
//! - `Accept-Language` → response language (opt-in)
//!
//! Absent or non-UTF-8 headers leave the value empty. Nothing happens on the
//! way out.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use http::header::{HeaderName, InvalidHeaderName, ACCEPT_LANGUAGE};

/// Default header carrying the trace id.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Default header carrying the user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Middleware that attaches trace and user ids to the request scope.
///
/// # Example
///
/// ```
/// use faultline_middleware::stages::TraceContextMiddleware;
///
/// let middleware = TraceContextMiddleware::with_headers("X-Request-Trace", "X-Account")
///     .unwrap()
///     .read_accept_language(true);
/// assert_eq!(middleware.trace_header().as_str(), "x-request-trace");
/// ```
#[derive(Debug, Clone)]
pub struct TraceContextMiddleware {
    trace_header: HeaderName,
    user_header: HeaderName,
    read_accept_language: bool,
}

impl TraceContextMiddleware {
    /// Creates the middleware reading `X-Trace-ID` and `X-User-ID`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trace_header: HeaderName::from_static(TRACE_ID_HEADER),
            user_header: HeaderName::from_static(USER_ID_HEADER),
            read_accept_language: false,
        }
    }

    /// Creates the middleware with custom header names.
    pub fn with_headers(trace_header: &str, user_header: &str) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            trace_header: HeaderName::from_bytes(trace_header.as_bytes())?,
            user_header: HeaderName::from_bytes(user_header.as_bytes())?,
            read_accept_language: false,
        })
    }

    /// Enables reading the response language from `Accept-Language`.
    #[must_use]
    pub fn read_accept_language(mut self, enabled: bool) -> Self {
        self.read_accept_language = enabled;
        self
    }

    /// Returns the trace id header name.
    #[must_use]
    pub fn trace_header(&self) -> &HeaderName {
        &self.trace_header
    }

    /// Returns the user id header name.
    #[must_use]
    pub fn user_header(&self) -> &HeaderName {
        &self.user_header
    }

    fn header_value(request: &Request, name: &HeaderName) -> String {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }
}

impl Default for TraceContextMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for TraceContextMiddleware {
    fn name(&self) -> &'static str {
        "trace_context"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            ctx.set_trace_id(Self::header_value(&request, &self.trace_header));
            ctx.set_user_id(Self::header_value(&request, &self.user_header));

            if self.read_accept_language {
                let preferred = request
                    .headers()
                    .get(ACCEPT_LANGUAGE)
                    .and_then(|value| value.to_str().ok())
                    .and_then(preferred_language);
                if let Some(language) = preferred {
                    ctx.set_language(language);
                }
            }

            next.run(ctx, request).await
        })
    }
}

/// Picks the highest-weighted concrete tag from an `Accept-Language` value.
///
/// Ties keep header order. `*` entries, `q=0` entries and entries whose `q`
/// is not a number in `0..=1` are ignored.
pub fn preferred_language(header: &str) -> Option<String> {
    let mut best: Option<(&str, f32)> = None;

    for entry in header.split(',') {
        let mut parts = entry.split(';');
        let tag = parts.next().unwrap_or_default().trim();
        if tag.is_empty() || tag == "*" {
            continue;
        }

        let weight = match parts.find_map(|param| param.trim().strip_prefix("q=")) {
            Some(q) => match q.trim().parse::<f32>() {
                Ok(weight) if (0.0..=1.0).contains(&weight) => weight,
                _ => continue,
            },
            None => 1.0,
        };
        if weight <= 0.0 {
            continue;
        }

        if best.map_or(true, |(_, current)| weight > current) {
            best = Some((tag, weight));
        }
    }

    best.map(|(tag, _)| tag.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    #[derive(Debug, PartialEq)]
    struct Seen {
        trace_id: String,
        user_id: String,
        language: String,
    }

    async fn run(middleware: &TraceContextMiddleware, request: Request) -> Seen {
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(|ctx, _req| {
            let seen = Seen {
                trace_id: ctx.trace_id().to_string(),
                user_id: ctx.user_id().to_string(),
                language: ctx.language().to_string(),
            };
            ctx.set_extension(seen);
            Box::pin(async { Response::json(StatusCode::OK, "{}") })
        });
        let _ = middleware.process(&mut ctx, request, next).await;
        ctx.remove_extension::<Seen>().unwrap()
    }

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::builder().uri("/test");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    #[tokio::test]
    async fn test_reads_trace_and_user() {
        let seen = run(
            &TraceContextMiddleware::new(),
            request(&[("X-Trace-ID", "abc"), ("X-User-ID", "123")]),
        )
        .await;

        assert_eq!(seen.trace_id, "abc");
        assert_eq!(seen.user_id, "123");
        assert_eq!(seen.language, "en");
    }

    #[tokio::test]
    async fn test_absent_headers_are_empty() {
        let seen = run(&TraceContextMiddleware::new(), request(&[])).await;
        assert!(seen.trace_id.is_empty());
        assert!(seen.user_id.is_empty());
    }

    #[tokio::test]
    async fn test_non_utf8_header_is_empty() {
        let request = http::Request::builder()
            .uri("/test")
            .header("X-Trace-ID", http::HeaderValue::from_bytes(b"caf\xe9").unwrap())
            .body(Full::new(Bytes::new()))
            .unwrap();
        let seen = run(&TraceContextMiddleware::new(), request).await;
        assert!(seen.trace_id.is_empty());
    }

    #[tokio::test]
    async fn test_custom_headers() {
        let middleware = TraceContextMiddleware::with_headers("X-Correlation", "X-Account").unwrap();
        let seen = run(
            &middleware,
            request(&[("X-Correlation", "c-1"), ("X-Trace-ID", "ignored")]),
        )
        .await;
        assert_eq!(seen.trace_id, "c-1");
    }

    #[test]
    fn test_invalid_header_name() {
        assert!(TraceContextMiddleware::with_headers("bad header", "X-User-ID").is_err());
    }

    #[tokio::test]
    async fn test_accept_language_opt_in() {
        let req = || request(&[("Accept-Language", "fr-CA,fr;q=0.9")]);

        let off = run(&TraceContextMiddleware::new(), req()).await;
        assert_eq!(off.language, "en");

        let on = run(&TraceContextMiddleware::new().read_accept_language(true), req()).await;
        assert_eq!(on.language, "fr-CA");
    }

    #[test]
    fn test_preferred_language() {
        assert_eq!(preferred_language("de").as_deref(), Some("de"));
        assert_eq!(
            preferred_language("en;q=0.5, fr;q=0.8, *").as_deref(),
            Some("fr")
        );
        assert_eq!(preferred_language("pt-BR, pt").as_deref(), Some("pt-BR"));
        assert_eq!(preferred_language("*, de;q=0").as_deref(), None);
        assert_eq!(preferred_language(""), None);
    }

    #[test]
    fn test_preferred_language_skips_bad_weights() {
        assert_eq!(preferred_language("fr;q=abc, en;q=0.9").as_deref(), Some("en"));
        assert_eq!(preferred_language("fr;q=NaN, en").as_deref(), Some("en"));
        assert_eq!(preferred_language("fr;q=2, de;q=0.3").as_deref(), Some("de"));
        assert_eq!(preferred_language("fr;q=-1"), None);
        assert_eq!(preferred_language("fr;q=1.0, en").as_deref(), Some("fr"));
    }
}
