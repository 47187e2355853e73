//! Fixed-order request-scope pipeline.
//!
//! ```text
//! Request → TraceContext → PanicRecovery → Handler
//!                                             ↓
//! Response ←──────────── (envelope on panic) ←┘
//! ```
//!
//! Trace context runs outermost so a recovered panic can still attach the
//! request's trace and user ids.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::responder::ResponseEmitter;
use crate::stages::{PanicRecoveryMiddleware, TraceContextMiddleware};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The fixed-order middleware pipeline.
///
/// # Example
///
/// ```
/// use faultline_core::{DefinitionCatalog, ExecutionMode, LocalizationResolver};
/// use faultline_middleware::{Pipeline, ResponseEmitter};
/// use std::sync::Arc;
///
/// let resolver = Arc::new(LocalizationResolver::new(Arc::new(DefinitionCatalog::new())));
/// let pipeline = Pipeline::builder(Arc::new(ResponseEmitter::new(resolver, ExecutionMode::Production)))
///     .build();
///
/// assert_eq!(pipeline.stage_names(), vec!["trace_context", "panic_recovery"]);
/// ```
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
    emitter: Arc<ResponseEmitter>,
}

impl Pipeline {
    /// Creates a pipeline builder around `emitter`.
    #[must_use]
    pub fn builder(emitter: Arc<ResponseEmitter>) -> PipelineBuilder {
        PipelineBuilder::new(emitter)
    }

    /// Returns the emitter handlers should use to build responses.
    #[must_use]
    pub fn emitter(&self) -> &Arc<ResponseEmitter> {
        &self.emitter
    }

    /// Processes a request through every stage, then the handler.
    pub async fn process<H>(
        &self,
        mut ctx: MiddlewareContext,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    /// Processes a request with a fresh context.
    pub async fn handle<H>(&self, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        self.process(MiddlewareContext::new(), request, handler).await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Pipeline`].
///
/// Only the configuration of each stage can change; the order cannot.
pub struct PipelineBuilder {
    emitter: Arc<ResponseEmitter>,
    trace_context: TraceContextMiddleware,
}

impl PipelineBuilder {
    /// Creates a builder with default header names.
    #[must_use]
    pub fn new(emitter: Arc<ResponseEmitter>) -> Self {
        Self {
            emitter,
            trace_context: TraceContextMiddleware::new(),
        }
    }

    /// Replaces the trace context stage configuration.
    #[must_use]
    pub fn trace_context(mut self, middleware: TraceContextMiddleware) -> Self {
        self.trace_context = middleware;
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        let recovery = PanicRecoveryMiddleware::new(Arc::clone(&self.emitter));
        let stages: Vec<BoxedMiddleware> = vec![Arc::new(self.trace_context), Arc::new(recovery)];
        Pipeline {
            stages,
            emitter: self.emitter,
        }
    }
}

/// Stage marker for the fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: trace/user id attachment
    TraceContext = 1,
    /// Stage 2: panic recovery around the handler
    PanicRecovery = 2,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TraceContext => "trace_context",
            Self::PanicRecovery => "panic_recovery",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 2] {
        [Self::TraceContext, Self::PanicRecovery]
    }
}
