//! HTTP client for the pagehost REST API
//!
//! One best-effort attempt per call: no retries, no timeout, no
//! cancellation. Non-success statuses become [`Error::Api`] carrying the
//! server's `error` field or the generic fallback.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::base::{DEFAULT_API_BASE, normalize_api_base};
use super::types::{
    ApiResponse, DeleteResponse, Project, ToggleResponse, UploadForm, UploadResponse,
};

/// Operations the stores need from the backend
#[async_trait]
pub trait ProjectApi: Send + Sync {
    /// List projects, optionally filtered by a search string
    async fn list_projects(&self, search: Option<&str>) -> Result<Vec<Project>>;

    /// Upload a new project archive
    async fn upload_project(&self, form: UploadForm) -> Result<UploadResponse>;

    /// Flip a project's active flag
    async fn toggle_project(&self, slug: &str) -> Result<ToggleResponse>;

    /// Remove a project
    async fn delete_project(&self, slug: &str) -> Result<DeleteResponse>;
}

/// reqwest-backed [`ProjectApi`]
#[derive(Clone)]
pub struct ApiClient {
    http_client: HttpClient,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

/// Builder for creating an ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    http_client: Option<HttpClient>,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base (defaults to the local backend)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Reuse an existing reqwest client
    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let base = normalize_api_base(self.base_url.as_deref().unwrap_or(DEFAULT_API_BASE))?;
        let base_url = Url::parse(&base)
            .map_err(|e| Error::InvalidInput(format!("Invalid API base URL '{}': {}", base, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidInput(format!(
                "API base URL '{}' cannot carry a path",
                base
            )));
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => HttpClient::builder().build().map_err(Error::Network)?,
        };

        Ok(ApiClient {
            http_client,
            base_url,
        })
    }
}

impl ApiClient {
    /// Create a client for the given API base
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        ApiClientBuilder::new().base_url(base_url).build()
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// The API base this client targets, without trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Build `{base}/{segments...}` with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn json_request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(method = %method, url = %url, "Sending API request");
        self.http_client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
    }

    /// Send and decode. The body is parsed as JSON before the status is checked.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(Error::Network)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(Error::Network)?;

        let body: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| Error::InvalidResponse(format!("Failed to parse response body: {}", e)))?;

        if !status.is_success() {
            let reason = ApiResponse::error_from(&body);
            warn!(status = status.as_u16(), reason = ?reason, "API request failed");
            return Err(Error::api(status.as_u16(), reason));
        }

        serde_json::from_value(body)
            .map_err(|e| Error::InvalidResponse(format!("Unexpected response shape: {}", e)))
    }
}

#[async_trait]
impl ProjectApi for ApiClient {
    async fn list_projects(&self, search: Option<&str>) -> Result<Vec<Project>> {
        let mut url = self.endpoint(&["projects"]);
        if let Some(query) = search.filter(|q| !q.is_empty()) {
            url.query_pairs_mut().append_pair("search", query);
        }
        self.execute(self.json_request(Method::GET, url)).await
    }

    async fn upload_project(&self, form: UploadForm) -> Result<UploadResponse> {
        let url = self.endpoint(&["upload"]);
        debug!(url = %url, file = %form.file_name, bytes = form.bytes.len(), "Uploading project");
        // reqwest sets the multipart content type and boundary
        let request = self
            .http_client
            .post(url)
            .multipart(form.into_multipart());
        self.execute(request).await
    }

    async fn toggle_project(&self, slug: &str) -> Result<ToggleResponse> {
        let url = self.endpoint(&["projects", slug, "toggle"]);
        self.execute(self.json_request(Method::PATCH, url)).await
    }

    async fn delete_project(&self, slug: &str) -> Result<DeleteResponse> {
        let url = self.endpoint(&["projects", slug]);
        self.execute(self.json_request(Method::DELETE, url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults_to_local_backend() {
        let client = ApiClient::builder().build().unwrap();
        assert_eq!(client.base_url(), DEFAULT_API_BASE);
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ApiClient::new("https://sites.example.com/api/").unwrap();
        assert_eq!(client.base_url(), "https://sites.example.com/api");
    }

    #[test]
    fn test_client_rejects_bad_base() {
        assert!(ApiClient::new("sites.example.com").is_err());
    }

    #[test]
    fn test_endpoint_paths() {
        let client = ApiClient::new("http://localhost:3000/api").unwrap();
        assert_eq!(
            client.endpoint(&["projects", "demo", "toggle"]).as_str(),
            "http://localhost:3000/api/projects/demo/toggle"
        );
        assert_eq!(
            client.endpoint(&["projects", "a b"]).as_str(),
            "http://localhost:3000/api/projects/a%20b"
        );
    }

    #[test]
    fn test_endpoint_on_bare_host() {
        let client = ApiClient::new("http://localhost:3000").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(
            client.endpoint(&["upload"]).as_str(),
            "http://localhost:3000/upload"
        );
    }

    #[test]
    fn test_client_debug() {
        let client = ApiClient::new("http://localhost:3000/api").unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("ApiClient"));
        assert!(debug.contains("localhost:3000"));
    }

    #[test]
    fn test_client_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiClient>();
    }
}
