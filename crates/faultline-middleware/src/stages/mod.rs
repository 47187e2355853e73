//! Request-scope middleware stages.
//!
//! 1. [`trace_context`] - attach trace/user ids and language to the scope
//! 2. [`panic_recovery`] - turn panics below it into error envelopes

pub mod panic_recovery;
pub mod trace_context;

pub use panic_recovery::PanicRecoveryMiddleware;
pub use trace_context::TraceContextMiddleware;
