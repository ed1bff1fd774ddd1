//! Progress display for long-running pipeline stages
//!
//! The manifest pass has no known length up front, so progress is shown as
//! an indicatif spinner with a message. Quiet mode hides it entirely.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

const TICK_INTERVAL: Duration = Duration::from_millis(120);
const TICK_STRINGS: &[&str] = &["◐", "◓", "◑", "◒", "●"];

/// Spinner shown while a stage runs
pub struct StageSpinner {
    bar: ProgressBar,
}

impl StageSpinner {
    /// Start a spinner with `message`, hidden when `quiet`
    pub fn start(message: impl Into<String>, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };

        match ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
            Ok(style) => bar.set_style(style.tick_strings(TICK_STRINGS)),
            Err(e) => debug!("Falling back to default spinner style: {}", e),
        }

        bar.set_message(message.into());
        bar.enable_steady_tick(TICK_INTERVAL);
        Self { bar }
    }

    /// Stop the spinner, leaving `message` on screen
    pub fn finish(self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    /// Stop the spinner and remove it from the terminal
    pub fn clear(self) {
        self.bar.finish_and_clear();
    }
}
