//! Zip archive output shared by concurrent producers.
//!
//! The zip writer is not safe for concurrent use, so every
//! "start entry + write bytes" sequence runs under one mutex. Names that
//! collide with an entry already written get a numeric suffix (`_2`, `_3`, ...).

use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::filename::unique_entry_name;

/// First numeric suffix used when an entry name is already taken.
const DUPLICATE_SUFFIX_START: usize = 2;

/// Errors writing the output archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive file (or its parent directory) could not be created.
    #[error("failed to create archive {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The zip writer refused to start an entry.
    #[error("failed to add archive entry {name}: {source}")]
    EntryCreate {
        name: String,
        #[source]
        source: ZipError,
    },

    /// Writing an entry's bytes failed.
    #[error("failed to write archive entry {name}: {source}")]
    EntryWrite {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing the central directory or syncing the file failed.
    #[error("failed to finalize archive {path}: {message}")]
    Finalize { path: PathBuf, message: String },

    /// The archive was already finalized.
    #[error("archive {path} is already finalized")]
    Finished { path: PathBuf },
}

/// Destination for downloaded file contents.
pub trait ArchiveSink: Send + Sync {
    /// Stores `bytes` under `name`, returning the entry name actually used.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] if the entry cannot be created or written.
    fn add_entry(&self, name: &str, bytes: &[u8]) -> Result<String, ArchiveError>;

    /// Completes the archive, returning the number of entries in it.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Finalize`] if the archive cannot be completed and
    /// [`ArchiveError::Finished`] if called twice.
    fn finish(&self) -> Result<usize, ArchiveError>;
}

/// Seekable byte target a zip archive is written into.
pub trait ArchiveTarget: Write + Seek + Send {
    /// Makes written bytes durable once the archive is complete.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn sync(&mut self) -> std::io::Result<()> {
        self.flush()
    }
}

impl ArchiveTarget for File {
    fn sync(&mut self) -> std::io::Result<()> {
        self.sync_all()
    }
}

impl ArchiveTarget for Cursor<Vec<u8>> {}

struct ArchiveState<W: ArchiveTarget> {
    zip: Option<ZipWriter<W>>,
    entries: HashSet<String>,
}

/// Single zip archive, on local storage by default.
pub struct ArchiveWriter<W: ArchiveTarget = File> {
    path: PathBuf,
    options: SimpleFileOptions,
    state: Mutex<ArchiveState<W>>,
}

impl<W: ArchiveTarget> std::fmt::Debug for ArchiveWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveWriter")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ArchiveWriter<File> {
    /// Creates (or truncates) the archive file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Create`] if the file or its directory cannot be created.
    #[instrument(level = "debug", fields(path = %path.display()))]
    pub fn create(path: &Path) -> Result<Self, ArchiveError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ArchiveError::Create {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let file = File::create(path).map_err(|source| ArchiveError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("archive created");
        Ok(Self::with_target(path, file))
    }
}

impl<W: ArchiveTarget> ArchiveWriter<W> {
    /// Wraps an already-open target. `path` is only used in errors and logs.
    pub fn with_target(path: impl Into<PathBuf>, target: W) -> Self {
        Self {
            path: path.into(),
            options: SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .unix_permissions(0o644),
            state: Mutex::new(ArchiveState {
                zip: Some(ZipWriter::new(target)),
                entries: HashSet::new(),
            }),
        }
    }

    /// Returns the archive path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the central directory and syncs the target, handing it back.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Finalize`] if the zip trailer cannot be written
    /// or the target cannot be synced, and [`ArchiveError::Finished`] if called twice.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub fn finish_target(&self) -> Result<(usize, W), ArchiveError> {
        let mut state = self.lock();
        let zip = state.zip.take().ok_or_else(|| ArchiveError::Finished {
            path: self.path.clone(),
        })?;

        let mut target = zip.finish().map_err(|e| ArchiveError::Finalize {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        target.sync().map_err(|e| ArchiveError::Finalize {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let entries = state.entries.len();
        info!(entries, "archive finalized");
        Ok((entries, target))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ArchiveState<W>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: ArchiveTarget> ArchiveSink for ArchiveWriter<W> {
    fn add_entry(&self, name: &str, bytes: &[u8]) -> Result<String, ArchiveError> {
        // One critical section per file: entry creation and byte write must not interleave.
        let mut state = self.lock();
        let ArchiveState { zip, entries } = &mut *state;
        let zip = zip.as_mut().ok_or_else(|| ArchiveError::Finished {
            path: self.path.clone(),
        })?;

        let entry_name = unique_entry_name(entries, name, DUPLICATE_SUFFIX_START);
        if entry_name != name {
            debug!(requested = %name, entry = %entry_name, "entry name taken; using suffix");
        }

        zip.start_file(entry_name.as_str(), self.options)
            .map_err(|source| ArchiveError::EntryCreate {
                name: entry_name.clone(),
                source,
            })?;

        if let Err(source) = zip.write_all(bytes) {
            if let Err(abort_err) = zip.abort_file() {
                warn!(entry = %entry_name, error = %abort_err, "failed to discard partial entry");
            }
            return Err(ArchiveError::EntryWrite {
                name: entry_name,
                source,
            });
        }

        entries.insert(entry_name.clone());
        Ok(entry_name)
    }

    fn finish(&self) -> Result<usize, ArchiveError> {
        self.finish_target().map(|(entries, _)| entries)
    }
}
