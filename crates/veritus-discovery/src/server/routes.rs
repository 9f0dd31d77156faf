//! HTTP route handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use axum_extra::extract::CookieJar;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use super::auth::{caller_from_jar, user_cookie};
use super::error::ApiError;
use crate::catalog::{TRENDING_TOPICS, featured_papers};
use crate::coordinator::{Caller, JobHandle, PollEvent};
use crate::models::{CreateJobOptions, JobId, SearchType};

const SUMMARY_FAILED: &str = "Failed to generate AI summary";
const REVIEW_FAILED: &str = "Failed to generate detailed review";

type ApiResult<T> = Result<T, ApiError>;

pub(super) async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "veritus-discovery",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// --- auth ---

pub(super) async fn auth_status(jar: CookieJar) -> impl IntoResponse {
    let user_id = match caller_from_jar(&jar) {
        Caller::User(id) => Some(id),
        Caller::Anonymous => None,
    };
    Json(json!({ "authenticated": user_id.is_some(), "userId": user_id }))
}

#[derive(Debug, Deserialize)]
pub(super) struct RegisterRequest {
    #[serde(default)]
    email: Option<String>,
}

pub(super) async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.unwrap_or_default();
    let user = state.users.register(&email).await?;

    let cookie = user_cookie(&user.id.to_string(), state.config.secure_cookies)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "isAcademic": user.is_academic })),
    ))
}

// --- jobs ---

#[derive(Debug, Deserialize)]
pub(super) struct CreateJobRequest {
    #[serde(default, rename = "type")]
    search_type: Option<String>,
    #[serde(default)]
    options: Option<CreateJobOptions>,
}

fn parse_search_type(value: &str) -> Option<SearchType> {
    [SearchType::KeywordSearch, SearchType::QuerySearch, SearchType::CombinedSearch]
        .into_iter()
        .find(|t| t.as_str() == value)
}

pub(super) async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateJobRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(search_type), Some(options)) = (req.search_type, req.options) else {
        return Err(ApiError::bad_request("Missing type or options"));
    };
    let search_type = parse_search_type(&search_type)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown search type '{search_type}'")))?;
    options.validate(search_type).map_err(ApiError::bad_request)?;

    let job_id = state.veritus.create_job(search_type, &options).await?;
    Ok(Json(json!({ "jobId": job_id })))
}

pub(super) async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let payload = state.veritus.job_status(&JobId::new(path_id(job_id)?)).await?;
    Ok(Json(payload.normalized()))
}

// --- topic searches ---

#[derive(Debug, Deserialize)]
pub(super) struct TopicSearchRequest {
    #[serde(default)]
    topic: String,
}

pub(super) async fn topic_search(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<TopicSearchRequest>,
) -> ApiResult<impl IntoResponse> {
    let caller = caller_from_jar(&jar);
    let handle = state.coordinator.submit(&caller, &req.topic).await?;
    Ok(Json(json!({ "jobId": handle.job_id() })))
}

/// Stream a job's poll events. Closing the connection drops the session, which
/// cancels it.
pub(super) async fn topic_events(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(job_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let Caller::User(user_id) = caller_from_jar(&jar) else {
        return Err(ApiError::unauthorized());
    };

    let job_id = JobId::new(path_id(job_id)?);
    let session = state.coordinator.poll(JobHandle::from_id(job_id.clone()));
    state.polls.register(&user_id, &job_id, session.cancel_handle()).await;

    tracing::info!(%job_id, user_id, "Opened poll event stream");

    let stream = session.map(|event| poll_event_to_sse(&event));

    Ok((
        [
            ("X-Accel-Buffering", "no"),
            ("Cache-Control", "no-cache, no-store, must-revalidate"),
        ],
        Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping")),
    ))
}

pub(super) fn poll_event_to_sse(event: &PollEvent) -> Result<Event, axum::Error> {
    match event {
        PollEvent::Pending { status, attempt, next_poll_in } => {
            Event::default().event("pending").json_data(json!({
                "status": status.as_str(),
                "attempt": attempt,
                "nextPollInMs": u64::try_from(next_poll_in.as_millis()).unwrap_or(u64::MAX),
            }))
        }
        PollEvent::Succeeded(results) => Event::default()
            .event("succeeded")
            .json_data(json!({ "status": "success", "results": results })),
        PollEvent::Failed(failure) => Event::default()
            .event("failed")
            .json_data(json!({ "status": "error", "error": failure.to_string() })),
    }
}

// --- papers ---

pub(super) async fn get_paper(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.veritus.get_paper(&path_id(id)?).await?))
}

/// Path parameters arrive percent-decoded; anything that could change which
/// upstream endpoint is addressed is refused.
fn path_id(raw: String) -> ApiResult<String> {
    let unsafe_char = |c: char| matches!(c, '/' | '\\' | '?' | '#') || c.is_control();
    if matches!(raw.trim(), "" | "." | "..") || raw.chars().any(unsafe_char) {
        return Err(ApiError::bad_request("Invalid identifier"));
    }
    Ok(raw)
}

#[derive(Debug, Deserialize)]
pub(super) struct PaperSearchQuery {
    title: Option<String>,
}

pub(super) async fn search_papers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PaperSearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let title = query
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Paper title is required"))?;
    Ok(Json(state.veritus.search_papers(title.trim()).await?))
}

#[derive(Debug, Deserialize)]
pub(super) struct PaperTextRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    r#abstract: Option<String>,
    #[serde(default)]
    authors: Option<String>,
}

impl PaperTextRequest {
    fn title(&self) -> ApiResult<&str> {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Paper title is required"))
    }
}

pub(super) async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PaperTextRequest>,
) -> ApiResult<impl IntoResponse> {
    let summary = state
        .completion
        .summarize(req.title()?, req.r#abstract.as_deref())
        .await
        .map_err(|e| ApiError::from_completion(&e, SUMMARY_FAILED))?;
    Ok(Json(json!({ "summary": summary })))
}

pub(super) async fn review(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PaperTextRequest>,
) -> ApiResult<impl IntoResponse> {
    let authors = req.authors.as_deref().filter(|a| !a.is_empty()).unwrap_or("Unknown");
    let review = state
        .completion
        .review(req.title()?, req.r#abstract.as_deref(), authors)
        .await
        .map_err(|e| ApiError::from_completion(&e, REVIEW_FAILED))?;
    Ok(Json(json!({ "review": review })))
}

// --- catalog & admin ---

pub(super) async fn trending_topics() -> impl IntoResponse {
    Json(json!({ "topics": TRENDING_TOPICS }))
}

pub(super) async fn trending_papers() -> impl IntoResponse {
    Json(featured_papers())
}

pub(super) async fn admin_stats(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.users.stats(state.config.academic_goal).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PollFailure;
    use crate::models::RemoteStatus;

    #[test]
    fn test_parse_search_type() {
        assert_eq!(parse_search_type("querySearch"), Some(SearchType::QuerySearch));
        assert_eq!(parse_search_type("combinedSearch"), Some(SearchType::CombinedSearch));
        assert_eq!(parse_search_type("QuerySearch"), None);
    }

    #[test]
    fn test_poll_events_render() {
        let pending = PollEvent::Pending {
            status: RemoteStatus::Queued,
            attempt: 1,
            next_poll_in: Duration::from_millis(2000),
        };
        assert!(poll_event_to_sse(&pending).is_ok());
        assert!(poll_event_to_sse(&PollEvent::Succeeded(vec![])).is_ok());
        assert!(poll_event_to_sse(&PollEvent::Failed(PollFailure::RemoteJob)).is_ok());
    }

    #[test]
    fn test_path_id_rejects_endpoint_escapes() {
        assert_eq!(path_id("job-42".into()).unwrap(), "job-42");
        assert_eq!(path_id("12345".into()).unwrap(), "12345");
        for bad in ["", "..", ".", "../papers/secret", "a?b=1", "a#b", "a\\b", "a\nb"] {
            let err = path_id(bad.into()).unwrap_err();
            assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST, "{bad:?}");
        }
    }
}
