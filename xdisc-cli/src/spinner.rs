//! Progress spinner for a single extraction run.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// A spinner showing the latest progress message of a run.
pub(crate) struct RunSpinner {
    bar: ProgressBar,
}

impl RunSpinner {
    /// Create and start the spinner. When `quiet` is true it is hidden.
    pub(crate) fn new(quiet: bool) -> Self {
        let bar = ProgressBar::new_spinner();
        if quiet {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg}") {
            bar.set_style(style.tick_chars("/-\\|"));
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub(crate) fn update(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    /// Run `f` with the spinner hidden, so log output does not tear it.
    pub(crate) fn suspend<F: FnOnce()>(&self, f: F) {
        self.bar.suspend(f);
    }

    /// Stop ticking and clear the spinner line.
    pub(crate) fn finish(&self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }
}
