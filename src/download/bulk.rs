//! Bulk download of a project's files into a single archive.
//!
//! The pipeline is: list files → worker pool fetches them concurrently →
//! results are drained in completion order → each success is written to the
//! archive → the archive is finalized once every worker has exited.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use projctl_core::api::{ApiClient, ApiCredentials, ApiFileSource, FileScope, HttpTimeouts, build_http_client};
//! use projctl_core::download::{BulkOptions, HttpClient, TracingReporter, download_to_archive};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = ApiCredentials { token: "token".into(), client_id: None, company_id: None };
//! let http = build_http_client(&credentials, HttpTimeouts::default())?;
//! let source = ApiFileSource::new(ApiClient::new(http.clone(), "https://api.example.com/graphql")?);
//! let client = HttpClient::new(http, "https://files.example.com/download")?;
//! let outcome = download_to_archive(
//!     &source,
//!     &FileScope::project("project-id"),
//!     Arc::new(client),
//!     &BulkOptions::new(5, "files.zip"),
//!     Arc::new(TracingReporter),
//! )
//! .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::archive::{ArchiveError, ArchiveSink, ArchiveWriter};
use super::client::FileFetcher;
use super::pool::{DownloadResult, WorkerPool};
use super::report::{Reporter, RunSummary, SummaryCounter};
use crate::api::{FileDescriptor, FileScope, FileSource, ListError};

/// Whole-run failures. Per-file failures never surface here.
#[derive(Debug, Error)]
pub enum BulkError {
    /// Enumerating the files failed; nothing was downloaded.
    #[error(transparent)]
    List(#[from] ListError),

    /// The archive could not be created.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Every file was processed but the archive could not be finalized.
    #[error("{source} ({summary})")]
    Finalize {
        summary: RunSummary,
        #[source]
        source: ArchiveError,
    },
}

/// Parameters for one bulk download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOptions {
    /// Maximum concurrent downloads (clamped to `1..=MAX_PARALLEL`).
    pub parallel: usize,
    /// Destination archive path.
    pub output: PathBuf,
}

impl BulkOptions {
    pub fn new(parallel: usize, output: impl Into<PathBuf>) -> Self {
        Self {
            parallel,
            output: output.into(),
        }
    }
}

/// Result of a bulk download that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    /// The scope contained no files; no archive was created.
    NoFiles,
    /// Files were processed and the archive was finalized.
    Archived {
        path: PathBuf,
        summary: RunSummary,
    },
}

/// Default archive file name, stamped with the local time: `files-YYYYMMDD-HHMMSS.zip`.
#[must_use]
pub fn default_archive_name() -> String {
    chrono::Local::now()
        .format("files-%Y%m%d-%H%M%S.zip")
        .to_string()
}

/// Lists the files in `scope` and downloads them into one archive.
///
/// # Errors
///
/// Returns [`BulkError::List`] if enumeration fails (before any download),
/// [`BulkError::Archive`] if the archive cannot be created, and
/// [`BulkError::Finalize`] if it cannot be finalized. A failed finalize still
/// carries the run summary, and the partial file is removed.
#[instrument(skip(source, fetcher, reporter), fields(project_id = %scope.project_id, output = %options.output.display()))]
pub async fn download_to_archive(
    source: &dyn FileSource,
    scope: &FileScope,
    fetcher: Arc<dyn FileFetcher>,
    options: &BulkOptions,
    reporter: Arc<dyn Reporter>,
) -> Result<BulkOutcome, BulkError> {
    let listing = source.list_files(scope).await?;

    if listing.is_empty() {
        info!("no files found");
        return Ok(BulkOutcome::NoFiles);
    }

    info!(files = listing.len(), parallel = options.parallel, "starting bulk download");
    let writer = create_archive(options.output.clone()).await?;

    let result = archive_and_finish(
        WorkerPool::new(options.parallel),
        listing.files,
        fetcher,
        writer,
        reporter,
    )
    .await;

    match result {
        Ok(summary) => Ok(BulkOutcome::Archived {
            path: options.output.clone(),
            summary,
        }),
        Err(e) => {
            remove_partial_archive(&options.output).await;
            Err(e)
        }
    }
}

async fn create_archive(path: PathBuf) -> Result<Arc<ArchiveWriter>, ArchiveError> {
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || ArchiveWriter::create(&task_path))
        .await
        .map_err(|e| ArchiveError::Create {
            path,
            source: std::io::Error::other(e.to_string()),
        })?
        .map(Arc::new)
}

/// Runs [`archive_files`] and then finalizes `sink` off the async runtime.
///
/// # Errors
///
/// Returns [`BulkError::Finalize`], carrying the run summary, if the sink
/// cannot be finalized.
pub async fn archive_and_finish<S>(
    pool: WorkerPool,
    files: Vec<FileDescriptor>,
    fetcher: Arc<dyn FileFetcher>,
    sink: Arc<S>,
    reporter: Arc<dyn Reporter>,
) -> Result<RunSummary, BulkError>
where
    S: ArchiveSink + 'static,
{
    let summary = archive_files(pool, files, fetcher, sink.clone(), reporter).await;

    let finished = tokio::task::spawn_blocking(move || sink.finish())
        .await
        .unwrap_or_else(|e| {
            Err(ArchiveError::Finalize {
                path: PathBuf::new(),
                message: e.to_string(),
            })
        });

    match finished {
        Ok(entries) => {
            debug!(entries, "archive finished");
            Ok(summary)
        }
        Err(source) => Err(BulkError::Finalize { summary, source }),
    }
}

/// Downloads `files` with `pool` and writes each success to `sink`.
///
/// Returns once every worker has exited and every result has been handled.
/// Every job is counted exactly once. The caller owns finalizing the sink.
pub async fn archive_files(
    pool: WorkerPool,
    files: Vec<FileDescriptor>,
    fetcher: Arc<dyn FileFetcher>,
    sink: Arc<dyn ArchiveSink>,
    reporter: Arc<dyn Reporter>,
) -> RunSummary {
    let counter = SummaryCounter::new();
    let mut run = pool.start(files, fetcher, Arc::clone(&reporter));
    let total = run.total();

    while let Some(result) = run.next_result().await {
        handle_result(result, &sink, reporter.as_ref(), &counter).await;
    }

    let panicked = run.join().await;
    if panicked > 0 {
        warn!(panicked, "some download workers panicked");
    }

    // Jobs whose worker died before reporting still count as failures.
    let lost = total.saturating_sub(counter.snapshot().total());
    if lost > 0 {
        warn!(lost, "download results lost; counting them as failed");
        for _ in 0..lost {
            counter.record_failure();
        }
    }

    let summary = counter.snapshot();
    reporter.finished(&summary);
    summary
}

async fn handle_result(
    result: DownloadResult,
    sink: &Arc<dyn ArchiveSink>,
    reporter: &dyn Reporter,
    counter: &SummaryCounter,
) {
    let DownloadResult {
        index,
        descriptor,
        resolved_name,
        outcome,
    } = result;

    let bytes = match outcome {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(index, file_id = %descriptor.id, error = %e, "download failed");
            reporter.file_failed(&resolved_name, &e.to_string());
            counter.record_failure();
            return;
        }
    };

    let size = bytes.len();
    let sink = Arc::clone(sink);
    let name = resolved_name.clone();
    let written = tokio::task::spawn_blocking(move || sink.add_entry(&name, &bytes)).await;

    match written {
        Ok(Ok(entry_name)) => {
            debug!(index, entry = %entry_name, bytes = size, "archived file");
            reporter.file_archived(&entry_name, size);
            counter.record_success();
        }
        Ok(Err(e)) => {
            warn!(index, file_id = %descriptor.id, error = %e, "archive write failed");
            reporter.file_failed(&resolved_name, &e.to_string());
            counter.record_failure();
        }
        Err(e) => {
            warn!(index, file_id = %descriptor.id, error = %e, "archive write task panicked");
            reporter.file_failed(&resolved_name, "archive write panicked");
            counter.record_failure();
        }
    }
}

async fn remove_partial_archive(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        debug!(path = %path.display(), error = %e, "could not remove partial archive");
    }
}
