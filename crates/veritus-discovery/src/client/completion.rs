//! Chat-completion client for paper summaries and reviews.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint (Groq by default).
//! Transient failures are retried with exponential backoff; summaries are cached.

use std::time::Duration;

use moka::future::Cache;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{CompletionError, CompletionResult};

const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant that summarizes research papers for students.";

const REVIEW_SYSTEM_PROMPT: &str = "You are an expert research paper reviewer who provides \
     detailed, insightful analysis for students and researchers.";

const SUMMARY_MAX_TOKENS: u32 = 200;
const REVIEW_MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.7;

/// Completion API client.
#[derive(Clone)]
pub struct CompletionClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    summaries: Cache<String, String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl CompletionClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout.max(Duration::from_secs(60)))
            .connect_timeout(config.connect_timeout)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(500), Duration::from_secs(10))
            .build_with_max_retries(3);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let summaries = Cache::builder()
            .max_capacity(config.summary_cache_max_size)
            .time_to_live(config.summary_cache_ttl)
            .build();

        Ok(Self {
            client,
            api_key: config.completion_api_key.clone(),
            endpoint: format!("{}/chat/completions", config.completion_api_url.trim_end_matches('/')),
            model: config.completion_model.clone(),
            summaries,
        })
    }

    /// Summarize a paper in two or three sentences.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is not configured, fails, or returns no text.
    pub async fn summarize(&self, title: &str, r#abstract: Option<&str>) -> CompletionResult<String> {
        let key = cache_key(title, r#abstract);
        if let Some(cached) = self.summaries.get(&key).await {
            tracing::debug!(title, "Summary cache hit");
            return Ok(cached);
        }

        let prompt = summary_prompt(title, r#abstract);
        let summary = self.complete(SUMMARY_SYSTEM_PROMPT, &prompt, SUMMARY_MAX_TOKENS).await?;

        self.summaries.insert(key, summary.clone()).await;
        Ok(summary)
    }

    /// Produce a sectioned, in-depth review of a paper.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is not configured, fails, or returns no text.
    pub async fn review(
        &self,
        title: &str,
        r#abstract: Option<&str>,
        authors: &str,
    ) -> CompletionResult<String> {
        let prompt = review_prompt(title, r#abstract, authors);
        self.complete(REVIEW_SYSTEM_PROMPT, &prompt, REVIEW_MAX_TOKENS).await
    }

    async fn complete(&self, system: &str, prompt: &str, max_tokens: u32) -> CompletionResult<String> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::NotConfigured)?;

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: TEMPERATURE,
            max_tokens,
        };
        let body = serde_json::to_string(&request)?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = super::error_message(&text).unwrap_or(text);
            tracing::error!(status = status.as_u16(), %message, "Completion API error");
            return Err(CompletionError::Api { status: status.as_u16(), message });
        }

        let parsed: ChatResponse = serde_json::from_slice(&response.bytes().await?)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(CompletionError::Empty)
    }
}

fn cache_key(title: &str, r#abstract: Option<&str>) -> String {
    use md5::{Digest, Md5};

    let mut hasher = Md5::new();
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(r#abstract.unwrap_or_default().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn summary_prompt(title: &str, r#abstract: Option<&str>) -> String {
    format!(
        "Summarize this research paper for students in 2-3 concise sentences:\n\n\
         Title: {title}\n\
         Abstract: {abstract_text}\n\n\
         Cover:\n\
         1. The problem it addresses.\n\
         2. The key findings.\n\
         3. Why it matters to students and researchers.\n\n\
         Stay clear and practical, under 100 words.",
        abstract_text = r#abstract.unwrap_or("No abstract available"),
    )
}

fn review_prompt(title: &str, r#abstract: Option<&str>, authors: &str) -> String {
    format!(
        "Write an in-depth review of this research paper for students and researchers:\n\n\
         Title: {title}\n\
         Authors: {authors}\n\
         Abstract: {abstract_text}\n\n\
         Organize the review under these headings:\n\n\
         ## Research Problem\n\
         The problem addressed, why it matters, and where existing approaches fall short.\n\n\
         ## Methodology\n\
         The methods used, what is novel about them, and the key technical ideas.\n\n\
         ## Key Findings\n\
         The main results, the evidence behind them, and how significant they are.\n\n\
         ## Impact & Applications\n\
         How the work advances the field and who benefits in practice.\n\n\
         ## Future Directions\n\
         Open questions and likely next steps.\n\n\
         Be thorough but accessible; avoid unnecessary jargon.",
        abstract_text = r#abstract.unwrap_or("No abstract available"),
    )
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("configured", &self.api_key.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_fall_back_for_missing_abstract() {
        assert!(summary_prompt("T", None).contains("No abstract available"));
        let review = review_prompt("T", Some("A"), "Unknown");
        assert!(review.contains("Authors: Unknown"));
        assert!(review.contains("Abstract: A"));
        assert!(review.contains("## Methodology"));
    }

    #[test]
    fn test_cache_key_distinguishes_abstracts() {
        assert_eq!(cache_key("T", Some("A")), cache_key("T", Some("A")));
        assert_ne!(cache_key("T", Some("A")), cache_key("T", None));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = CompletionClient::new(&Config::default()).unwrap();
        let err = client.summarize("T", None).await.unwrap_err();
        assert!(matches!(err, CompletionError::NotConfigured));
    }
}
