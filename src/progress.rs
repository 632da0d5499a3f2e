//! Terminal progress for bulk downloads.

use indicatif::{ProgressBar, ProgressStyle};

use crate::download::{Reporter, RunSummary};

/// Reporter that drives an `indicatif` progress bar.
///
/// Per-file lines are printed above the bar so they are not overwritten.
/// Failure lines go to stderr and are shown even in quiet mode.
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    bar: ProgressBar,
    quiet: bool,
}

impl ConsoleReporter {
    /// Creates a reporter drawing to stderr; `quiet` hides the bar and per-file lines.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} files {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar, quiet }
    }

    #[cfg(test)]
    fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            quiet: false,
        }
    }
}

impl Reporter for ConsoleReporter {
    fn downloading(&self, position: usize, total: usize, name: &str) {
        self.bar.set_length(u64::try_from(total).unwrap_or(u64::MAX));
        if !self.quiet {
            self.bar
                .println(format!("[{position}/{total}] downloading: {name}"));
        }
    }

    fn file_failed(&self, name: &str, reason: &str) {
        self.bar
            .suspend(|| eprintln!("failed: {name}: {reason}"));
        self.bar.inc(1);
    }

    fn file_archived(&self, _entry_name: &str, _bytes: usize) {
        self.bar.inc(1);
    }

    fn finished(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}
