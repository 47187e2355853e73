//! Panic recovery middleware.
//!
//! Runs the rest of the chain as a guarded unit. A panic anywhere below this
//! stage becomes a 500 `internal_error` envelope carrying the request's trace
//! and user ids; the panic never reaches the server loop and other requests
//! are unaffected.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::panic_capture::{self, PanicReport};
use crate::responder::ResponseEmitter;
use crate::types::{Request, Response};
use faultline_core::{ApiError, DEFAULT_LANGUAGE};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Middleware that converts handler panics into error envelopes.
#[derive(Debug, Clone)]
pub struct PanicRecoveryMiddleware {
    emitter: Arc<ResponseEmitter>,
}

impl PanicRecoveryMiddleware {
    /// Creates the middleware and installs the panic capture hook.
    #[must_use]
    pub fn new(emitter: Arc<ResponseEmitter>) -> Self {
        panic_capture::install_hook();
        Self { emitter }
    }

    fn recover(&self, ctx: &MiddlewareContext, message: String, report: Option<PanicReport>) -> Response {
        match &report {
            Some(report) => tracing::error!(
                trace_id = %ctx.trace_id(),
                user_id = %ctx.user_id(),
                elapsed = ?ctx.elapsed(),
                location = report.location.as_deref(),
                backtrace = %report.backtrace,
                "panic recovered: {message}"
            ),
            None => tracing::error!(
                trace_id = %ctx.trace_id(),
                user_id = %ctx.user_id(),
                elapsed = ?ctx.elapsed(),
                "panic recovered: {message}"
            ),
        }

        let err = ApiError::internal(anyhow::anyhow!("panic recovered: {message}"), None)
            .with_trace(ctx.trace_id(), ctx.user_id())
            .with_language(DEFAULT_LANGUAGE);
        self.emitter.emit_error(err)
    }
}

impl Middleware for PanicRecoveryMiddleware {
    fn name(&self) -> &'static str {
        "panic_recovery"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let outcome = AssertUnwindSafe(next.run(ctx, request)).catch_unwind().await;

            match outcome {
                Ok(response) => response,
                Err(payload) => {
                    let (message, report) = diagnose(payload.as_ref());
                    self.recover(ctx, message, report)
                }
            }
        })
    }
}

/// Pairs the unwind payload with the report the hook recorded for it.
///
/// `resume_unwind` skips the hook, so the slot may still hold a report from an
/// earlier panic on this thread. The slot is always drained and a report whose
/// message differs from the payload is discarded.
fn diagnose(payload: &(dyn Any + Send)) -> (String, Option<PanicReport>) {
    let message = panic_capture::payload_message(payload);
    let report = panic_capture::take_report().filter(|report| report.message == message);
    (message, report)
}
