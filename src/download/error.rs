//! Error types for the download module.
//!
//! Every variant carries the id of the remote file so per-file failures can be
//! reported to the user without extra bookkeeping.

use thiserror::Error;

/// Errors that can occur while fetching one remote file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, body read).
    #[error("network error downloading file {file_id}: {source}")]
    Network {
        /// Remote file id.
        file_id: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request or body read exceeded the configured timeout.
    #[error("timeout downloading file {file_id}")]
    Timeout {
        /// Remote file id.
        file_id: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} downloading file {file_id}")]
    HttpStatus {
        /// Remote file id.
        file_id: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The fetcher panicked while downloading this file.
    #[error("download of file {file_id} panicked: {message}")]
    Panicked {
        /// Remote file id.
        file_id: String,
        /// Panic payload, when it was a string.
        message: String,
    },

    /// The download URL could not be built from the configured base URL.
    #[error("invalid download URL for file {file_id}: {url}")]
    InvalidUrl {
        /// Remote file id.
        file_id: String,
        /// The offending base URL.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn from_reqwest(file_id: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                file_id: file_id.into(),
            }
        } else {
            Self::Network {
                file_id: file_id.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(file_id: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            file_id: file_id.into(),
            status,
        }
    }

    /// Creates a panic error from a caught panic payload.
    pub fn panicked(file_id: impl Into<String>, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::Panicked {
            file_id: file_id.into(),
            message,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(file_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::InvalidUrl {
            file_id: file_id.into(),
            url: url.into(),
        }
    }
}

// No From<reqwest::Error>: the file id is context the source error doesn't carry.
