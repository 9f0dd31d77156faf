//! Veritus search API client.
//!
//! Provides async HTTP client with:
//! - Connection pooling via reqwest
//! - Bearer authentication
//! - Process-wide rate limiting shared by every clone
//! - Error body decoding into [`ClientError`]

pub mod completion;

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use url::Url;

use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult};
use crate::models::{
    CreateJobOptions, CreateJobResponse, JobId, JobStatusPayload, Paper, SearchType,
};

pub use completion::CompletionClient;

/// Veritus API client.
#[derive(Clone)]
pub struct VeritusClient {
    /// HTTP client.
    client: Client,

    /// Shared outbound rate limiter.
    limiter: Arc<DefaultDirectRateLimiter>,

    /// API base URL.
    base_url: Url,

    has_api_key: bool,
}

impl VeritusClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value, the base URL cannot
    /// carry a path, or the HTTP client cannot be built.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.veritus_api_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Veritus API URL cannot carry a path: {base_url}");
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        if let Some(ref key) = config.api_key {
            headers.insert(reqwest::header::AUTHORIZATION, format!("Bearer {key}").parse()?);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            client,
            limiter,
            base_url,
            has_api_key: config.api_key.is_some(),
        })
    }

    /// Check if an API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.has_api_key
    }

    /// Create a search job.
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    pub async fn create_job(
        &self,
        search_type: SearchType,
        options: &CreateJobOptions,
    ) -> ClientResult<JobId> {
        let url = self.endpoint(&["job", search_type.as_str()])?;
        let params = options.query_params();
        let body = serde_json::to_string(&options.body())?;

        self.limiter.until_ready().await;

        let response = self.client.post(url).query(&params).body(body).send().await?;
        let response = handle_response(response).await?;
        let created: CreateJobResponse = serde_json::from_slice(&response.bytes().await?)?;

        tracing::info!(job_id = %created.job_id, search_type = search_type.as_str(), "Created search job");
        Ok(created.job_id)
    }

    /// Fetch the current status of a job.
    ///
    /// # Errors
    ///
    /// Returns error on API failure; a 429 surfaces as [`ClientError::RateLimited`].
    pub async fn job_status(&self, job_id: &JobId) -> ClientResult<JobStatusPayload> {
        let url = self.endpoint(&["job", job_id.as_str()])?;
        self.get(url, &[]).await
    }

    /// Get a single paper by corpus ID.
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    pub async fn get_paper(&self, corpus_id: &str) -> ClientResult<Paper> {
        let url = self.endpoint(&["papers", corpus_id])?;
        self.get(url, &[]).await
    }

    /// Search papers by title.
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    pub async fn search_papers(&self, title: &str) -> ClientResult<Vec<Paper>> {
        let url = self.endpoint(&["papers", "search"])?;
        self.get(url, &[("title", title.to_string())]).await
    }

    /// Remaining search credits for the configured API key.
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    pub async fn credits(&self) -> ClientResult<serde_json::Value> {
        let url = self.endpoint(&["user", "getCredits"])?;
        self.get(url, &[]).await
    }

    /// Append path segments to the base URL, percent-encoding each one.
    ///
    /// Dot segments and empty segments are rejected since they would address a
    /// different endpoint than the caller named.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        if let Some(bad) = segments.iter().find(|s| matches!(s.trim(), "" | "." | "..")) {
            return Err(ClientError::bad_request(format!("Invalid identifier: {bad:?}")));
        }

        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Make a GET request.
    async fn get<T>(&self, url: Url, params: &[(&str, String)]) -> ClientResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.limiter.until_ready().await;

        let response = self.client.get(url).query(params).send().await?;
        let response = handle_response(response).await?;
        let bytes = response.bytes().await?;

        serde_json::from_slice(&bytes).map_err(ClientError::from)
    }
}

/// Map non-success statuses to [`ClientError`]s.
async fn handle_response(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(ClientError::rate_limited(retry_after));
    }

    let text = response.text().await.unwrap_or_default();
    let message = error_message(&text)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

    tracing::warn!(status = status.as_u16(), %message, "Veritus API error");

    Err(match status.as_u16() {
        404 => ClientError::not_found(message),
        400 => ClientError::bad_request(message),
        500..=599 => ClientError::server(status.as_u16(), message),
        code => ClientError::UnexpectedStatus { status: code, message },
    })
}

/// Extract the human-readable message from an `{"error": ...}` style body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let field = value.get("error").or_else(|| value.get("message"))?;
    match field {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Object(obj) => {
            obj.get("message").and_then(|m| m.as_str()).map(str::to_string)
        }
        _ => None,
    }
}

impl std::fmt::Debug for VeritusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VeritusClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_api_key", &self.has_api_key)
            .finish()
    }
}
