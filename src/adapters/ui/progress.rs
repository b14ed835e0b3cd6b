//! Spinners for long-running actions.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Start a steady spinner with `message`. Finish it with [`finish`].
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Replace the spinner with a final status line.
pub fn finish(spinner: &ProgressBar, ok: bool, message: impl Into<String>) {
    let mark = if ok { "✔" } else { "✘" };
    spinner.finish_with_message(format!("{} {}", mark, message.into()));
}
