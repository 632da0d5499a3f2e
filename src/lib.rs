//! projctl core library
//!
//! This library provides the bulk file retrieval behind the `projctl` CLI:
//! it lists every file in a project (or folder) through the workspace
//! GraphQL API, downloads them concurrently, and packs the results into a
//! single zip archive.
//!
//! # Architecture
//!
//! - [`api`] - Authenticated HTTP client and the paginated file lister
//! - [`download`] - Worker pool, download client, archive writer, summary
//! - [`config`] - Config file, environment overrides, CLI merge
//! - [`progress`] - Terminal progress reporting

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod config;
pub mod download;
pub mod progress;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use api::{
    ApiClient, ApiCredentials, ApiFileSource, ClientError, FileDescriptor, FileListing, FileScope,
    FileSource, HttpTimeouts, ListError, build_http_client,
};
pub use config::{CliOverrides, ConfigError, EnvOverrides, FileConfig, ResolvedConfig};
pub use download::{
    ArchiveError, ArchiveSink, ArchiveTarget, ArchiveWriter, BulkError, BulkOptions, BulkOutcome,
    DEFAULT_PARALLEL, DownloadError, FileFetcher, HttpClient, MAX_PARALLEL, Reporter, RunSummary,
    TracingReporter, WorkerPool, archive_and_finish, archive_files, download_to_archive,
};
pub use progress::ConsoleReporter;
