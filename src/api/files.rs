//! File enumeration for a project or folder.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::client::{ApiClient, GraphqlFailure};
use super::error::ListError;
use super::types::{FileDescriptor, FileListing, FileScope};

/// Number of files requested per page.
pub const PAGE_SIZE: u32 = 100;

const FILES_QUERY: &str = "query ProjectFiles($projectId: String!, $folderId: String, $skip: Int!, $take: Int!) {
  files(filter: { projectId: $projectId, folderId: $folderId }, skip: $skip, take: $take) {
    items { uid name extension }
    pageInfo { totalItems hasNextPage }
  }
}";

/// Supplies the ordered list of files to download for a scope.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Lists every file in `scope`, in server order.
    ///
    /// # Errors
    ///
    /// Returns [`ListError`] if the listing cannot be retrieved in full.
    async fn list_files(&self, scope: &FileScope) -> Result<FileListing, ListError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FilesVariables<'a> {
    project_id: &'a str,
    folder_id: Option<&'a str>,
    skip: u32,
    take: u32,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct FilesData {
    files: FilesPage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilesPage {
    items: Vec<FileDescriptor>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    total_items: Option<u64>,
    #[serde(default)]
    has_next_page: bool,
}

/// [`FileSource`] backed by the workspace GraphQL API.
#[derive(Debug, Clone)]
pub struct ApiFileSource {
    client: ApiClient,
    page_size: u32,
}

impl ApiFileSource {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            page_size: PAGE_SIZE,
        }
    }

    /// Overrides the page size (minimum 1).
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    async fn fetch_page(&self, scope: &FileScope, skip: u32) -> Result<FilesPage, ListError> {
        let variables = FilesVariables {
            project_id: &scope.project_id,
            folder_id: scope.folder_id.as_deref(),
            skip,
            take: self.page_size,
        };

        let response: GraphqlResponse<FilesData> = self
            .client
            .post_graphql(FILES_QUERY, variables)
            .await
            .map_err(|failure| match failure {
                GraphqlFailure::Network(source) => ListError::Network {
                    project_id: scope.project_id.clone(),
                    source,
                },
                GraphqlFailure::Status(status) => ListError::HttpStatus {
                    project_id: scope.project_id.clone(),
                    status: status.as_u16(),
                },
                GraphqlFailure::Decode(message) => ListError::Decode {
                    project_id: scope.project_id.clone(),
                    message,
                },
            })?;

        if !response.errors.is_empty() {
            let message = response
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ListError::Api {
                project_id: scope.project_id.clone(),
                message,
            });
        }

        response
            .data
            .map(|data| data.files)
            .ok_or_else(|| ListError::Decode {
                project_id: scope.project_id.clone(),
                message: "response has neither data nor errors".to_string(),
            })
    }
}

#[async_trait]
impl FileSource for ApiFileSource {
    #[instrument(skip(self), fields(project_id = %scope.project_id, folder_id = ?scope.folder_id))]
    async fn list_files(&self, scope: &FileScope) -> Result<FileListing, ListError> {
        let mut listing = FileListing::default();
        let mut skip = 0u32;

        loop {
            let page = self.fetch_page(scope, skip).await?;
            let fetched = page.items.len();
            debug!(skip, fetched, has_next = page.page_info.has_next_page, "fetched file page");

            if listing.total.is_none() {
                listing.total = page.page_info.total_items;
            }
            listing.files.extend(page.items);

            if !page.page_info.has_next_page {
                break;
            }
            if fetched == 0 {
                warn!(skip, "server reported another page but returned no items; stopping");
                break;
            }
            skip = skip.saturating_add(u32::try_from(fetched).unwrap_or(u32::MAX));
        }

        info!(files = listing.len(), total = ?listing.total, "listed files");
        Ok(listing)
    }
}
