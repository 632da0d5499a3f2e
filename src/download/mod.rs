//! Concurrent file retrieval into a single archive.
//!
//! This module downloads every file a [`FileSource`](crate::api::FileSource)
//! lists with a bounded worker pool and writes the results into one zip.
//!
//! # Features
//!
//! - Fixed-size worker pool (default 5, clamped to `1..=100`)
//! - Per-file failures are counted, never fatal
//! - Archive writes serialized behind one lock
//! - Duplicate entry names get a numeric suffix (`_2`, `_3`, ...)
//! - Configurable timeouts (30s connect, 5min read by default)

mod archive;
mod bulk;
mod client;
pub(crate) mod constants;
mod error;
mod filename;
mod pool;
mod report;

pub use archive::{ArchiveError, ArchiveSink, ArchiveTarget, ArchiveWriter};
pub use bulk::{
    BulkError, BulkOptions, BulkOutcome, archive_and_finish, archive_files, default_archive_name,
    download_to_archive,
};
pub use client::{FileFetcher, HttpClient};
pub use constants::{DEFAULT_PARALLEL, MAX_PARALLEL};
pub use error::DownloadError;
pub use filename::{resolve_entry_name, sanitize_filename};
pub use pool::{DownloadJob, DownloadResult, PoolRun, WorkerPool};
pub use report::{Reporter, RunSummary, SummaryCounter, TracingReporter};
