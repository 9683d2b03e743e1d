//! Spinner for slow steps (DNS lookups while cleaning, git sync)

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// A spinner that disappears in quiet mode
pub struct StepSpinner {
    bar: Option<ProgressBar>,
}

impl StepSpinner {
    /// Start ticking with `message`; a no-op when `quiet`
    pub fn start(message: &str, quiet: bool) -> Self {
        if quiet {
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed:.dim})") {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    /// Change the message
    pub fn update(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Hide the spinner while `f` writes to the terminal
    pub fn suspend<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.bar {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    pub fn success(self, message: &str) {
        if let Some(bar) = self.bar {
            bar.finish_with_message(format!("{} {message}", console::style("\u{2713}").green()));
        }
    }

    pub fn fail(self, message: &str) {
        if let Some(bar) = self.bar {
            bar.finish_with_message(format!("{} {message}", console::style("\u{2717}").red()));
        }
    }
}
