//! Reporting interface for store diagnostics
//!
//! The store never prints. Progress messages and recoverable warnings are
//! handed to a [`Reporter`] supplied by whoever owns the store, so the CLI
//! can style them and tests can inspect them.

use std::cell::RefCell;
use std::rc::Rc;

/// Sink for store progress messages and warnings
pub trait Reporter {
    /// Informational progress message
    fn log(&self, message: &str);

    /// Recoverable problem the user should fix by hand
    fn warn(&self, message: &str);
}

impl<R: Reporter + ?Sized> Reporter for Rc<R> {
    fn log(&self, message: &str) {
        (**self).log(message);
    }

    fn warn(&self, message: &str) {
        (**self).warn(message);
    }
}

/// Forwards everything to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn log(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Keeps every message in memory, in arrival order
#[derive(Debug, Default)]
pub struct RecordingReporter {
    logs: RefCell<Vec<String>>,
    warnings: RefCell<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs.borrow().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }

    /// Whether any warning contains `needle`
    pub fn warned_about(&self, needle: &str) -> bool {
        self.warnings.borrow().iter().any(|w| w.contains(needle))
    }
}

impl Reporter for RecordingReporter {
    fn log(&self, message: &str) {
        tracing::debug!("{message}");
        self.logs.borrow_mut().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        tracing::debug!("warning: {message}");
        self.warnings.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_reporter_through_rc() {
        let recorder = Rc::new(RecordingReporter::new());
        let shared: Rc<dyn Reporter> = recorder.clone();

        shared.log("reading");
        shared.warn("Duplicate alias - web");

        assert_eq!(recorder.logs(), vec!["reading"]);
        assert!(recorder.warned_about("Duplicate alias"));
        assert!(!recorder.warned_about("lookup"));
    }
}
