//! Progress feedback utilities for CLI commands
//!
//! Provides spinners and progress bars for long-running operations.
//! All progress output is suppressed when --quiet flag is set.

use apki_core::BuildProgress;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::time::Duration;

/// Create a spinner with a message
pub fn spinner(message: &str, quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    set_spinner_style(&pb);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(SPINNER_TICK);
    Some(pb)
}

const SPINNER_TICK: Duration = Duration::from_millis(100);

fn set_spinner_style(pb: &ProgressBar) {
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(style);
    }
}

/// Finish a spinner with a success message
pub fn finish_spinner(pb: Option<ProgressBar>, message: &str) {
    finish_with(pb, "{prefix:.green} {msg}", "✓", message);
}

/// Finish a spinner with a warning message
pub fn finish_spinner_warn(pb: Option<ProgressBar>, message: &str) {
    finish_with(pb, "{prefix:.yellow} {msg}", "!", message);
}

/// Clear a spinner without leaving a line behind
pub fn clear_spinner(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}

fn finish_with(pb: Option<ProgressBar>, template: &str, prefix: &'static str, message: &str) {
    if let Some(pb) = pb {
        if let Ok(style) = ProgressStyle::default_spinner().template(template) {
            pb.set_style(style);
        }
        pb.set_prefix(prefix);
        pb.finish_with_message(message.to_string());
    }
}

/// Build progress rendered as a bar over the record count.
///
/// The bar is created on the first event so that a reused graph never
/// draws anything. When built over a spinner, the spinner's line turns into
/// the bar while records are written and back into the spinner afterwards.
pub struct BuildBar {
    quiet: bool,
    spinner: Option<ProgressBar>,
    bar: Mutex<Option<ProgressBar>>,
}

impl BuildBar {
    pub fn new(quiet: bool) -> Self {
        Self::over_spinner(None, quiet)
    }

    pub fn over_spinner(spinner: Option<ProgressBar>, quiet: bool) -> Self {
        Self {
            quiet,
            spinner,
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        f(&mut *self.bar.lock());
    }
}

impl BuildProgress for BuildBar {
    fn on_start(&self, total: usize) {
        if self.quiet {
            return;
        }
        let pb = match self.spinner {
            Some(ref spinner) => {
                spinner.disable_steady_tick();
                spinner.reset();
                spinner.set_length(total as u64);
                spinner.clone()
            }
            None => ProgressBar::new(total as u64),
        };
        if let Ok(style) =
            ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb.set_message("Indexing packages");
        self.with_bar(|bar| *bar = Some(pb));
    }

    fn on_record(&self, done: usize) {
        self.with_bar(|bar| {
            if let Some(pb) = bar {
                pb.set_position(done as u64);
            }
        });
    }

    fn on_finish(&self) {
        self.with_bar(|bar| {
            let Some(pb) = bar.take() else {
                return;
            };
            if self.spinner.is_some() {
                set_spinner_style(&pb);
                pb.set_message("Writing build marker...");
                pb.enable_steady_tick(SPINNER_TICK);
            } else {
                pb.finish_and_clear();
            }
        });
    }
}
