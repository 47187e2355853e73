//! Error observation hook.
//!
//! An [`ErrorObserver`] is told about every error the emitter renders, after
//! the response has been built. Any `Fn(&str, u16)` closure is an observer.

use std::fmt;
use std::sync::Arc;

/// Receives `(key, code)` for each emitted error.
pub trait ErrorObserver: Send + Sync {
    /// Called once per emitted error with the error's true key and status.
    fn observe(&self, key: &str, code: u16);
}

impl<F> ErrorObserver for F
where
    F: Fn(&str, u16) + Send + Sync,
{
    fn observe(&self, key: &str, code: u16) {
        self(key, code);
    }
}

/// Fans an observation out to several observers in registration order.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn ErrorObserver>>,
}

impl ObserverSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observer.
    pub fn push(&mut self, observer: Arc<dyn ErrorObserver>) {
        self.observers.push(observer);
    }

    /// Returns the number of observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns `true` if no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl ErrorObserver for ObserverSet {
    fn observe(&self, key: &str, code: u16) {
        for observer in &self.observers {
            observer.observe(key, code);
        }
    }
}

impl fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_closure_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer = move |key: &str, code: u16| sink.lock().push((key.to_string(), code));

        observer.observe("teapot", 418);
        assert_eq!(*seen.lock(), vec![("teapot".to_string(), 418)]);
    }

    #[test]
    fn test_set_fans_out_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut set = ObserverSet::new();
        for tag in ["first", "second"] {
            let sink = Arc::clone(&seen);
            set.push(Arc::new(move |key: &str, _code: u16| {
                sink.lock().push(format!("{tag}:{key}"));
            }));
        }

        set.observe("forbidden", 403);
        assert_eq!(set.len(), 2);
        assert_eq!(*seen.lock(), vec!["first:forbidden", "second:forbidden"]);
    }
}
