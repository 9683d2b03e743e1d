//! Color utilities for CLI output
//!
//! Consistent styling for hosts and command outcomes.

use console::{Style, StyledObject};
use pssh_core::AddOutcome;

/// Style an alias the same way everywhere
pub fn alias_style(alias: &str) -> StyledObject<&str> {
    Style::new().cyan().bold().apply_to(alias)
}

/// Short label for the result of adding a host
///
/// - inserted -> green
/// - unchanged -> dim
/// - conflict -> red
pub fn outcome_label(outcome: &AddOutcome) -> StyledObject<&'static str> {
    match outcome {
        AddOutcome::Inserted { .. } => Style::new().green().apply_to("Added:"),
        AddOutcome::Unchanged { .. } => Style::new().dim().apply_to("Unchanged:"),
        AddOutcome::Conflict { .. } => Style::new().red().bold().apply_to("Conflict:"),
    }
}

/// Print a horizontal rule, unless quiet
pub fn rule(quiet: bool) {
    if !quiet {
        println!("{}", style_rule());
    }
}

fn style_rule() -> StyledObject<String> {
    Style::new().dim().apply_to("-".repeat(60))
}
