//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::{ClientError, CompletionError, RegistrationError, SubmissionError};

/// Error rendered as `{"error": message}` with a status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map a completion failure onto a response with a fixed user-facing message.
    #[must_use]
    pub fn from_completion(err: &CompletionError, message: &str) -> Self {
        tracing::error!(error = %err, "{message}");
        match err {
            CompletionError::NotConfigured => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "AI features are not configured")
            }
            _ => Self::internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        let status = err
            .status()
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.message())
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Unauthenticated => Self::unauthorized(),
            SubmissionError::EmptyTopic => Self::bad_request(err.to_string()),
            SubmissionError::Rejected { status, message } => Self::new(
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message,
            ),
            SubmissionError::Network(_) => Self::new(StatusCode::BAD_GATEWAY, err.to_string()),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::InvalidEmail => Self::bad_request(err.to_string()),
            RegistrationError::Store(_) => {
                tracing::error!(error = %err, "Registration failed");
                Self::internal("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_keeps_upstream_status() {
        let err = ApiError::from(ClientError::server(503, "maintenance"));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.message, "maintenance");

        let err = ApiError::from(ClientError::not_found("Paper not found"));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_submission_error_statuses() {
        assert_eq!(ApiError::from(SubmissionError::Unauthenticated).status, StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(SubmissionError::EmptyTopic).status, StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(SubmissionError::Network("refused".into())).status,
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_completion_not_configured_is_unavailable() {
        let err = ApiError::from_completion(&CompletionError::NotConfigured, "Failed to generate AI summary");
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);

        let err = ApiError::from_completion(&CompletionError::Empty, "Failed to generate AI summary");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Failed to generate AI summary");
    }
}
