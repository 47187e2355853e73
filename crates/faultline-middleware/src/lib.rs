//! # Faultline Middleware
//!
//! Request-scope middleware and the response emitter for Faultline.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → TraceContext → PanicRecovery → Handler
//! ```
//!
//! | Stage | Middleware | Purpose |
//! |-------|------------|---------|
//! | 1 | Trace Context | Copy `X-Trace-ID` / `X-User-ID` into the scope |
//! | 2 | Panic Recovery | Turn handler panics into 500 envelopes |
//!
//! Handlers turn their `Result` into a response through the
//! [`ResponseEmitter`], which owns localization, exposure, logging and
//! observer notification.
//!
//! ## Example
//!
//! ```
//! use faultline_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages[0].name(), "trace_context");
//! assert_eq!(stages[1].name(), "panic_recovery");
//! ```

#![doc(html_root_url = "https://docs.rs/faultline-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod panic_capture;
pub mod pipeline;
pub mod responder;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, HandlerFn, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use responder::ResponseEmitter;
pub use types::{Request, Response, ResponseExt};
