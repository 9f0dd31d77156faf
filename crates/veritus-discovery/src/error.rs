//! Error types for the Veritus discovery service.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.
//! Errors from the upstream HTTP APIs are [`ClientError`]s; the job coordinator
//! translates them into [`SubmissionError`] or [`PollFailure`] before they reach a caller.

use std::time::Duration;

/// Errors from the HTTP client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limited by the upstream API (429 response)
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Wait time suggested by the API, if any
        retry_after: Option<Duration>,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from API
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create a rate limited error, optionally with the API's retry-after hint.
    #[must_use]
    pub fn rate_limited(seconds: Option<u64>) -> Self {
        Self::RateLimited { retry_after: seconds.map(Duration::from_secs) }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Returns true if this is a 429 condition.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Server { .. })
    }

    /// Get the retry-after duration if this is a rate limit error that carried one.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status the upstream answered with, if the request got that far.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::NotFound { .. } => Some(404),
            Self::BadRequest { .. } => Some(400),
            Self::Server { status, .. } | Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Parse(_) => None,
        }
    }

    /// Human-readable message without the variant prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NotFound { resource } => resource.clone(),
            Self::BadRequest { message }
            | Self::Server { message, .. }
            | Self::UnexpectedStatus { message, .. } => message.clone(),
            _ => self.to_string(),
        }
    }
}

/// Errors from the chat-completion client.
#[derive(thiserror::Error, Debug)]
pub enum CompletionError {
    /// No API key configured for the completion endpoint
    #[error("Completion API key is not configured")]
    NotConfigured,

    /// Transport or middleware failure
    #[error("Completion request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),

    /// Non-success response from the completion API
    #[error("Completion API request failed ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },

    /// Response body could not be decoded
    #[error("Failed to parse completion response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The model returned no content
    #[error("No content generated")]
    Empty,
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(reqwest_middleware::Error::Reqwest(err))
    }
}

/// Why a job could not be submitted.
#[derive(thiserror::Error, Debug)]
pub enum SubmissionError {
    /// Caller has not registered
    #[error("Authentication required")]
    Unauthenticated,

    /// Topic empty after trimming
    #[error("Topic must not be empty")]
    EmptyTopic,

    /// Search API rejected the request
    #[error("{message}")]
    Rejected {
        /// HTTP status returned by the search API
        status: u16,
        /// Message from the error body or a generic fallback
        message: String,
    },

    /// Search API unreachable
    #[error("Search service unreachable: {0}")]
    Network(String),
}

impl From<ClientError> for SubmissionError {
    fn from(err: ClientError) -> Self {
        match err.status() {
            Some(status) => Self::Rejected { status, message: err.message() },
            None => Self::Network(err.to_string()),
        }
    }
}

/// Terminal failure of a polling session.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PollFailure {
    /// A status check failed for a reason other than rate limiting
    #[error("{0}")]
    Transient(String),

    /// The search service reported that the job failed
    #[error("Search job failed.")]
    RemoteJob,
}

/// Errors from user registration.
#[derive(thiserror::Error, Debug)]
pub enum RegistrationError {
    /// Missing or malformed email address
    #[error("Valid email is required")]
    InvalidEmail,

    /// Backing store failure
    #[error("User store error: {0}")]
    Store(String),
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for completion operations.
pub type CompletionResult<T> = Result<T, CompletionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_retryable() {
        assert!(ClientError::rate_limited(Some(60)).is_retryable());
        assert!(ClientError::server(500, "Internal error").is_retryable());

        assert!(!ClientError::not_found("job-1").is_retryable());
        assert!(!ClientError::bad_request("invalid query").is_retryable());
    }

    #[test]
    fn test_client_error_retry_after() {
        let err = ClientError::rate_limited(Some(60));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
        assert!(err.is_rate_limited());

        assert_eq!(ClientError::rate_limited(None).retry_after(), None);
        assert_eq!(ClientError::not_found("paper").retry_after(), None);
    }

    #[test]
    fn test_submission_error_from_client_error() {
        let err = SubmissionError::from(ClientError::bad_request("query too short"));
        match err {
            SubmissionError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "query too short");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_poll_failure_messages() {
        assert_eq!(PollFailure::RemoteJob.to_string(), "Search job failed.");
        assert_eq!(PollFailure::Transient("boom".into()).to_string(), "boom");
    }
}
