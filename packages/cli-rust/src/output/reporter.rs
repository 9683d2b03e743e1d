//! Terminal reporter for store diagnostics
//!
//! Warnings always reach stderr with a styled prefix; progress messages
//! only show up with `-v`.

use console::style;
use pssh_core::Reporter;

/// Prints store messages to stderr
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    verbose: u8,
}

impl ConsoleReporter {
    pub fn new(verbose: u8) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn log(&self, message: &str) {
        tracing::debug!("{message}");
        if self.verbose > 0 {
            eprintln!("{} {}", style("[info]").cyan(), style(message).dim());
        }
    }

    fn warn(&self, message: &str) {
        tracing::debug!("warning: {message}");
        eprintln!("{} {}", style("Warning:").yellow().bold(), message);
    }
}
