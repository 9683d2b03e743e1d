//! Output utilities for CLI commands
//!
//! Spinners for slow steps, shared color styles, and the reporter that
//! prints store warnings.

pub mod colors;
pub mod reporter;
pub mod spinner;

pub use colors::{alias_style, outcome_label, rule};
pub use reporter::ConsoleReporter;
pub use spinner::StepSpinner;
