//! Error types for the workspace API client.

use thiserror::Error;

/// Errors building the authenticated HTTP client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A credential could not be encoded as an HTTP header value.
    #[error("invalid value for header {header}: credentials must be visible ASCII")]
    InvalidHeader {
        /// Header name.
        header: &'static str,
    },

    /// The reqwest builder rejected the configuration.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The configured API endpoint is not a valid URL.
    #[error("invalid API endpoint: {url}")]
    InvalidEndpoint {
        /// The rejected URL.
        url: String,
    },
}

/// Errors enumerating the files of a scope.
///
/// Any of these aborts a bulk download before the first file is fetched.
#[derive(Debug, Error)]
pub enum ListError {
    /// Network-level error talking to the API.
    #[error("network error listing files for project {project_id}: {source}")]
    Network {
        project_id: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP response from the API.
    #[error("HTTP {status} listing files for project {project_id}")]
    HttpStatus { project_id: String, status: u16 },

    /// Response body was not the expected JSON shape.
    #[error("unexpected response listing files for project {project_id}: {message}")]
    Decode { project_id: String, message: String },

    /// The API answered with GraphQL errors.
    #[error("API error listing files for project {project_id}: {message}")]
    Api { project_id: String, message: String },
}
