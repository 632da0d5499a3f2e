//! HTTP client for fetching the bytes of one remote file.
//!
//! The download URL is derived from the file id alone:
//! `{files_base_url}/{id}`. Authentication is carried by the wrapped reqwest
//! client's default headers.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;
use crate::api::{ClientError, FileDescriptor};

/// Fetches the content of one remote file.
///
/// Implementations must be safe to call concurrently from several workers.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Returns the full content of the file.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on any network, status, or body read failure.
    async fn fetch(&self, descriptor: &FileDescriptor) -> Result<Vec<u8>, DownloadError>;
}

/// HTTP client for downloading files into memory.
///
/// Stateless apart from connection pooling; clone it freely across workers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    files_base: Url,
}

impl HttpClient {
    /// Creates a download client rooted at `files_base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidEndpoint`] if the base URL cannot be parsed.
    pub fn new(client: Client, files_base_url: &str) -> Result<Self, ClientError> {
        let files_base = Url::parse(files_base_url).map_err(|_| ClientError::InvalidEndpoint {
            url: files_base_url.to_string(),
        })?;
        Ok(Self { client, files_base })
    }

    /// Builds the download URL for a file id.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] if the base URL cannot take path segments.
    pub fn download_url(&self, file_id: &str) -> Result<Url, DownloadError> {
        let mut url = self.files_base.clone();
        url.path_segments_mut()
            .map_err(|()| DownloadError::invalid_url(file_id, self.files_base.as_str()))?
            .pop_if_empty()
            .push(file_id);
        Ok(url)
    }

    /// Downloads the full content of one file.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The download URL cannot be built
    /// - The request fails (network error, timeout)
    /// - The server returns a non-success status
    /// - Reading the body fails part way
    #[instrument(skip(self, descriptor), fields(file_id = %descriptor.id))]
    pub async fn fetch(&self, descriptor: &FileDescriptor) -> Result<Vec<u8>, DownloadError> {
        let file_id = descriptor.id.as_str();
        let url = self.download_url(file_id)?;
        debug!(url = %url, "starting download");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(file_id, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(file_id, status.as_u16()));
        }

        let capacity = response
            .content_length()
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or(0);
        let mut body = Vec::with_capacity(capacity);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::from_reqwest(file_id, e))?;
            body.extend_from_slice(&chunk);
        }

        debug!(bytes = body.len(), "download complete");
        Ok(body)
    }
}

#[async_trait]
impl FileFetcher for HttpClient {
    async fn fetch(&self, descriptor: &FileDescriptor) -> Result<Vec<u8>, DownloadError> {
        HttpClient::fetch(self, descriptor).await
    }
}
