//! HTTP client for the shelfscan recognition API.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client as HttpClient, ClientBuilder};
use serde::de::DeserializeOwned;
use shelfscan_core::{
    CatalogItem, Error, ImageSubmission, Page, PageQuery, RecognitionTask, Result, StatusPayload,
    StatusRecord,
};
use url::Url;

use crate::error::HttpError;
use crate::upload::ImageUpload;
use crate::ScanConfig;

/// Tracing target for client operations.
pub const TRACING_TARGET: &str = "shelfscan_reqwest::client";

/// Header carrying the static API key.
const API_KEY_HEADER: &str = "X-API-Key";

/// Client for the shelfscan recognition REST API.
///
/// Cheap to clone; all clones share one connection pool. The client performs
/// no retries of its own — retry policy for the status endpoint lives in
/// [`StatusPoller`](shelfscan_core::StatusPoller).
///
/// # Examples
///
/// ```ignore
/// use shelfscan_reqwest::{ScanClient, ScanConfig};
///
/// let config = ScanConfig::new("https://api.shelfscan.dev/v2", "my-key")?;
/// let client = ScanClient::new(config)?;
/// let tasks = client.recognition_tasks(Default::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ScanClient {
    http_client: HttpClient,
    config: ScanConfig,
}

impl ScanClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the API key cannot be encoded as a
    /// header value or the underlying HTTP client cannot be built.
    pub fn new(config: ScanConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut api_key = HeaderValue::from_str(config.api_key())
            .map_err(|e| Error::config(format!("Invalid API key: {}", e)))?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);

        let http_client = ClientBuilder::new()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %config.base_url(),
            timeout = ?config.timeout(),
            "Recognition client initialized"
        );

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Get a reference to the client configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// List catalog items.
    pub async fn catalog_items(&self, query: PageQuery) -> Result<Page<CatalogItem>> {
        let url = self.endpoint(&["catalog-items"], Some(query))?;

        tracing::debug!(
            target: TRACING_TARGET,
            url = %url,
            "Fetching catalog items"
        );

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(HttpError::Reqwest)?;
        let page: Page<CatalogItem> = Self::handle_response(response).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            count = page.len(),
            total = ?page.total,
            "Catalog items fetched"
        );

        Ok(page)
    }

    /// List image-recognition tasks.
    pub async fn recognition_tasks(&self, query: PageQuery) -> Result<Page<RecognitionTask>> {
        let url = self.endpoint(&["image-recognition", "tasks"], Some(query))?;

        tracing::debug!(
            target: TRACING_TARGET,
            url = %url,
            "Fetching recognition tasks"
        );

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(HttpError::Reqwest)?;
        let page: Page<RecognitionTask> = Self::handle_response(response).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            count = page.len(),
            "Recognition tasks fetched"
        );

        Ok(page)
    }

    /// Submit one image to a recognition task.
    ///
    /// On success the returned submission carries the image identifier used
    /// for subsequent status polling.
    pub async fn submit_image(
        &self,
        task_uuid: &str,
        upload: ImageUpload,
    ) -> Result<ImageSubmission> {
        if task_uuid.trim().is_empty() {
            return Err(Error::validation("task uuid must not be empty"));
        }
        upload.validate()?;

        let url = self.endpoint(&["image-recognition", "tasks", task_uuid, "images"], None)?;

        tracing::info!(
            target: TRACING_TARGET,
            url = %url,
            file_name = %upload.file_name,
            size = upload.bytes.len(),
            "Submitting image"
        );

        let file_name = upload.file_name.clone();
        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(file_name)
            .mime_str(&upload.mime_type)
            .map_err(|e| {
                Error::validation(format!("Invalid MIME type '{}': {}", upload.mime_type, e))
            })?;
        let form = reqwest::multipart::Form::new().part("images", part);

        let response = self
            .http_client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(HttpError::Reqwest)?;
        let submission: ImageSubmission = Self::handle_response(response).await?;

        tracing::info!(
            target: TRACING_TARGET,
            task_uuid = %submission.task_uuid,
            image_id = %submission.image_id,
            "Image submitted"
        );

        Ok(submission)
    }

    /// Fetch the current status of one submitted image.
    ///
    /// The status endpoint is eventually consistent: it returns 404 until
    /// the submission is registered, surfaced as [`Error::NotFound`].
    pub async fn image_status(&self, task_uuid: &str, image_id: &str) -> Result<StatusRecord> {
        if task_uuid.trim().is_empty() {
            return Err(Error::validation("task uuid must not be empty"));
        }
        if image_id.trim().is_empty() {
            return Err(Error::validation("image id must not be empty"));
        }

        let url = self.endpoint(
            &["image-recognition", "tasks", task_uuid, "images", image_id],
            None,
        )?;

        tracing::debug!(
            target: TRACING_TARGET,
            url = %url,
            "Fetching image status"
        );

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(HttpError::Reqwest)?;
        let payload: StatusPayload = Self::handle_response(response).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            task_uuid = %task_uuid,
            image_id = %image_id,
            status = %payload.status,
            "Image status fetched"
        );

        Ok(payload.into_record(task_uuid, image_id))
    }

    /// Build an endpoint URL by appending path segments to the base URL.
    ///
    /// Segments are appended rather than joined so versioned bases like
    /// `/v2` survive.
    fn endpoint(&self, segments: &[&str], query: Option<PageQuery>) -> Result<Url> {
        let mut url = self.config.base_url().clone();
        url.path_segments_mut()
            .map_err(|_| Error::config("Base URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);

        if let Some(query) = query {
            url.query_pairs_mut()
                .append_pair("limit", &query.limit.to_string())
                .append_pair("offset", &query.offset.to_string());
        }

        Ok(url)
    }

    /// Decode a response, classifying non-2xx statuses into the domain error.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await.map_err(HttpError::Reqwest)?;
            serde_json::from_str(&body).map_err(|e| {
                Error::serialization(format!("Failed to decode response body: {}", e))
            })
        } else {
            let message = response
                .text()
                .await
                .ok()
                .filter(|body| !body.is_empty())
                .unwrap_or_else(|| status.to_string());

            tracing::warn!(
                target: TRACING_TARGET,
                status = status.as_u16(),
                message = %message,
                "API request failed"
            );

            Err(Error::from_status(status.as_u16(), message))
        }
    }
}
