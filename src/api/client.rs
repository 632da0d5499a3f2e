//! Authenticated HTTP client shared by the API and download paths.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::error::ClientError;
use crate::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::user_agent;

/// Header carrying the company (workspace) the token acts on.
const COMPANY_HEADER: &str = "x-company-id";
/// Header identifying the registered API client.
const CLIENT_HEADER: &str = "x-client-id";

/// Credentials attached to every request.
#[derive(Clone)]
pub struct ApiCredentials {
    pub token: String,
    pub client_id: Option<String>,
    pub company_id: Option<String>,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("token", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("company_id", &self.company_id)
            .finish()
    }
}

/// Connect and read timeouts for HTTP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect_secs: u64,
    pub read_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: CONNECT_TIMEOUT_SECS,
            read_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// Builds a reqwest client that sends the credentials as default headers.
///
/// # Errors
///
/// Returns [`ClientError::InvalidHeader`] if a credential is not a valid header
/// value, or [`ClientError::Build`] if reqwest rejects the configuration.
pub fn build_http_client(
    credentials: &ApiCredentials,
    timeouts: HttpTimeouts,
) -> Result<Client, ClientError> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", credentials.token))
        .map_err(|_| ClientError::InvalidHeader { header: "authorization" })?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    for (header, value) in [
        (CLIENT_HEADER, credentials.client_id.as_deref()),
        (COMPANY_HEADER, credentials.company_id.as_deref()),
    ] {
        let Some(value) = value else { continue };
        let value =
            HeaderValue::from_str(value).map_err(|_| ClientError::InvalidHeader { header })?;
        headers.insert(HeaderName::from_static(header), value);
    }

    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.read_secs))
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
        .default_headers(headers)
        .build()
        .map_err(ClientError::Build)
}

/// GraphQL request envelope.
#[derive(Debug, Serialize)]
struct GraphqlRequest<'a, V: Serialize> {
    query: &'a str,
    variables: V,
}

/// Outcome of one GraphQL POST before the caller attaches scope context.
#[derive(Debug)]
pub(crate) enum GraphqlFailure {
    Network(reqwest::Error),
    Status(StatusCode),
    Decode(String),
}

/// Thin GraphQL client for the workspace API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    endpoint: Url,
}

impl ApiClient {
    /// Creates a client posting to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidEndpoint`] if `endpoint` is not a valid URL.
    pub fn new(http: Client, endpoint: &str) -> Result<Self, ClientError> {
        let endpoint = Url::parse(endpoint).map_err(|_| ClientError::InvalidEndpoint {
            url: endpoint.to_string(),
        })?;
        Ok(Self { http, endpoint })
    }

    /// Posts a query and decodes the whole JSON response body into `T`.
    #[instrument(level = "debug", skip(self, query, variables), fields(endpoint = %self.endpoint))]
    pub(crate) async fn post_graphql<V, T>(
        &self,
        query: &str,
        variables: V,
    ) -> Result<T, GraphqlFailure>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .map_err(GraphqlFailure::Network)?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "graphql request rejected");
            return Err(GraphqlFailure::Status(status));
        }

        let body = response.bytes().await.map_err(GraphqlFailure::Network)?;
        serde_json::from_slice(&body).map_err(|e| GraphqlFailure::Decode(e.to_string()))
    }
}
