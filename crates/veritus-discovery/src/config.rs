//! Configuration for the Veritus discovery service.

use std::time::Duration;

use crate::coordinator::PollPolicy;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// Base URL for the Veritus discovery API.
    pub const VERITUS_API: &str = "https://discover.veritus.ai/api/v1";

    /// OpenAI-compatible completion endpoint (Groq).
    pub const COMPLETION_API: &str = "https://api.groq.com/openai/v1";

    /// Default completion model.
    pub const COMPLETION_MODEL: &str = "llama-3.3-70b-versatile";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Outbound Veritus requests per second, shared across all callers.
    pub const REQUESTS_PER_SECOND: u32 = 10;

    /// Summary cache TTL (1 hour).
    pub const SUMMARY_CACHE_TTL: Duration = Duration::from_secs(3600);

    /// Maximum cached summaries.
    pub const SUMMARY_CACHE_MAX_SIZE: u64 = 500;

    /// Maximum in-flight HTTP requests handled by the server.
    pub const MAX_CONCURRENT_REQUESTS: usize = 256;

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);
}

/// Fixed parameters of a topic search.
pub mod search {
    /// Result limit for topic searches.
    pub const RESULT_LIMIT: u32 = 100;

    /// Publication year range for topic searches.
    pub const YEAR_RANGE: &str = "2020:2024";

    /// Wrap a topic into a query long enough for the search API's length limits.
    #[must_use]
    pub fn query_for_topic(topic: &str) -> String {
        format!("Research regarding {topic} in the context of modern machine learning applications")
    }
}

/// Name of the cookie that identifies a registered user.
pub const USER_COOKIE: &str = "veritus-user";

/// Academic sign-up target shown on the admin dashboard.
pub const ACADEMIC_USER_GOAL: u64 = 42;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Veritus API key.
    pub api_key: Option<String>,

    /// Base URL for the Veritus API (overridable for mock servers).
    pub veritus_api_url: String,

    /// API key for the completion endpoint.
    pub completion_api_key: Option<String>,

    /// Base URL for the completion endpoint.
    pub completion_api_url: String,

    /// Completion model name.
    pub completion_model: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Outbound Veritus requests per second.
    pub requests_per_second: u32,

    /// Job polling policy.
    pub poll_policy: PollPolicy,

    /// Summary cache TTL.
    pub summary_cache_ttl: Duration,

    /// Maximum cached summaries.
    pub summary_cache_max_size: u64,

    /// Mark the user cookie `Secure`.
    pub secure_cookies: bool,

    /// Academic sign-up goal for the admin dashboard.
    pub academic_goal: u64,
}

impl Config {
    /// Create a configuration with the given API keys and production endpoints.
    #[must_use]
    pub fn new(api_key: Option<String>, completion_api_key: Option<String>) -> Self {
        Self {
            api_key,
            veritus_api_url: api::VERITUS_API.to_string(),
            completion_api_key,
            completion_api_url: api::COMPLETION_API.to_string(),
            completion_model: api::COMPLETION_MODEL.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            requests_per_second: api::REQUESTS_PER_SECOND,
            poll_policy: PollPolicy::default(),
            summary_cache_ttl: api::SUMMARY_CACHE_TTL,
            summary_cache_max_size: api::SUMMARY_CACHE_MAX_SIZE,
            secure_cookies: false,
            academic_goal: ACADEMIC_USER_GOAL,
        }
    }

    /// Create a test configuration pointing every upstream at a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            api_key: Some("test-key".to_string()),
            veritus_api_url: format!("{}/api/v1", base_url),
            completion_api_key: Some("test-completion-key".to_string()),
            completion_api_url: format!("{}/openai/v1", base_url),
            completion_model: api::COMPLETION_MODEL.to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            requests_per_second: 1000,
            poll_policy: PollPolicy::fast(),
            summary_cache_ttl: Duration::from_secs(60),
            summary_cache_max_size: 100,
            secure_cookies: false,
            academic_goal: ACADEMIC_USER_GOAL,
        }
    }

    /// Create configuration from environment variables (and `.env` if present).
    ///
    /// # Errors
    ///
    /// Returns error if environment variables are invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("VERITUS_API_KEY").ok();
        if api_key.is_none() {
            tracing::warn!("VERITUS_API_KEY is not set; search requests will be rejected upstream");
        }

        let completion_api_key =
            std::env::var("GROQ_API_KEY").or_else(|_| std::env::var("GROK_API_KEY")).ok();

        let mut config = Self::new(api_key, completion_api_key);

        if let Ok(url) = std::env::var("VERITUS_API_URL") {
            url::Url::parse(&url)
                .map_err(|e| anyhow::anyhow!("VERITUS_API_URL is not a valid URL: {e}"))?;
            config.veritus_api_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(url) = std::env::var("COMPLETION_API_URL") {
            url::Url::parse(&url)
                .map_err(|e| anyhow::anyhow!("COMPLETION_API_URL is not a valid URL: {e}"))?;
            config.completion_api_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("COMPLETION_MODEL") {
            config.completion_model = model;
        }
        if let Ok(flag) = std::env::var("SECURE_COOKIES") {
            config.secure_cookies = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    /// Check if a Veritus API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.has_api_key());
        assert_eq!(config.veritus_api_url, api::VERITUS_API);
        assert_eq!(config.poll_policy, PollPolicy::default());
    }

    #[test]
    fn test_config_for_testing() {
        let config = Config::for_testing("http://127.0.0.1:9999");
        assert_eq!(config.veritus_api_url, "http://127.0.0.1:9999/api/v1");
        assert_eq!(config.completion_api_url, "http://127.0.0.1:9999/openai/v1");
        assert!(config.has_api_key());
    }

    #[test]
    fn test_query_for_topic() {
        let query = search::query_for_topic("quantum computing");
        assert!(query.contains("quantum computing"));
        assert!(query.len() >= 50);
    }
}
