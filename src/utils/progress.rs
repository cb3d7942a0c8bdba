//! Spinner-based progress reporting for long-running phases.
//!
//! Wraps `indicatif` so commands can show activity during resolution and
//! builds. Spinners are disabled automatically when stderr is not a
//! terminal, keeping CI logs clean.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// A spinner shown while a phase runs.
pub struct PhaseSpinner {
    bar: ProgressBar,
}

impl PhaseSpinner {
    /// Start a spinner with the given message. When `enabled` is false (for
    /// `--quiet` or non-TTY output) the spinner is hidden entirely.
    #[must_use]
    pub fn start(message: impl Into<String>, enabled: bool) -> Self {
        let bar = if enabled && std::io::IsTerminal::is_terminal(&std::io::stderr()) {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .expect("static template is valid"),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_message(message.into());
        Self { bar }
    }

    /// Update the spinner message.
    pub fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    /// Finish the phase, replacing the spinner with a final line.
    pub fn finish(self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    /// Stop and erase the spinner without a final line.
    pub fn clear(self) {
        self.bar.finish_and_clear();
    }

    /// Print a line above the spinner without disturbing it.
    pub fn println(&self, line: impl AsRef<str>) {
        if self.bar.is_hidden() {
            eprintln!("{}", line.as_ref());
        } else {
            self.bar.println(line.as_ref());
        }
    }
}
