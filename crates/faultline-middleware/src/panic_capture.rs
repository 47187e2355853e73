//! Panic diagnostics capture.
//!
//! `catch_unwind` only yields the panic payload. The message location and a
//! backtrace are only observable from inside the panic hook, so
//! [`install_hook`] chains a hook that records a [`PanicReport`] in a
//! thread-local slot before delegating to the previous hook. The recovery
//! stage takes the report on the same thread right after the unwind.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, Location};
use std::sync::Once;

thread_local! {
    static LAST_PANIC: RefCell<Option<PanicReport>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

/// Diagnostics recorded for one panic.
#[derive(Debug)]
pub struct PanicReport {
    /// Panic message (`"Box<dyn Any>"` for non-string payloads).
    pub message: String,
    /// `file:line:column` of the panic site, if known.
    pub location: Option<String>,
    /// Backtrace captured at the panic site.
    pub backtrace: Backtrace,
}

impl fmt::Display for PanicReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {location}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Installs the capturing hook once per process, chaining the existing hook.
pub fn install_hook() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            record(info.payload(), info.location());
            previous(info);
        }));
    });
}

/// Takes the report recorded by the most recent panic on this thread.
pub fn take_report() -> Option<PanicReport> {
    LAST_PANIC.with(|slot| slot.borrow_mut().take())
}

/// Extracts a readable message from a `catch_unwind` payload.
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Box<dyn Any>".to_string())
}

fn record(payload: &(dyn Any + Send), location: Option<&Location<'_>>) {
    let report = PanicReport {
        message: payload_message(payload),
        location: location.map(ToString::to_string),
        backtrace: Backtrace::force_capture(),
    };
    LAST_PANIC.with(|slot| {
        if let Ok(mut slot) = slot.try_borrow_mut() {
            *slot = Some(report);
        }
    });
}
