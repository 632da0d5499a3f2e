//! Constants for the download module (timeouts, concurrency bounds).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default number of concurrent downloads.
pub const DEFAULT_PARALLEL: usize = 5;

/// Upper bound on concurrent downloads.
pub const MAX_PARALLEL: usize = 100;
