//! Run summary and progress reporting hooks.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{info, warn};

/// Final tally of a bulk download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Returns the number of files processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "succeeded: {}, failed: {}", self.succeeded, self.failed)
    }
}

/// Thread-safe counters backing a [`RunSummary`].
#[derive(Debug, Default)]
pub struct SummaryCounter {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl SummaryCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn snapshot(&self) -> RunSummary {
        RunSummary {
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// Receives observational progress events from a bulk download.
///
/// Implementations must not block; events arrive from worker tasks.
pub trait Reporter: Send + Sync {
    /// A worker is about to fetch file `position` of `total` (1-based).
    fn downloading(&self, position: usize, total: usize, name: &str);

    /// A file failed to download or could not be written to the archive.
    fn file_failed(&self, name: &str, reason: &str);

    /// A file was written to the archive under `entry_name`.
    fn file_archived(&self, entry_name: &str, bytes: usize);

    /// Every result has been drained.
    fn finished(&self, summary: &RunSummary);
}

/// Reporter that only emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn downloading(&self, position: usize, total: usize, name: &str) {
        info!("[{position}/{total}] downloading: {name}");
    }

    fn file_failed(&self, name: &str, reason: &str) {
        warn!(file = %name, %reason, "file failed");
    }

    fn file_archived(&self, entry_name: &str, bytes: usize) {
        info!(entry = %entry_name, bytes, "file archived");
    }

    fn finished(&self, summary: &RunSummary) {
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "bulk download complete"
        );
    }
}
