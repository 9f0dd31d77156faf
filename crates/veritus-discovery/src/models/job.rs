//! Search job models: creation options, raw status payloads and their normalized form.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Paper;

/// Opaque job identifier issued by the search service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Search mode supported by the job-creation endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchType {
    /// Match explicit phrases.
    KeywordSearch,
    /// Natural-language query.
    #[default]
    QuerySearch,
    /// Query plus phrases.
    CombinedSearch,
}

impl SearchType {
    /// Path segment used by the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KeywordSearch => "keywordSearch",
            Self::QuerySearch => "querySearch",
            Self::CombinedSearch => "combinedSearch",
        }
    }
}

/// Options for creating a search job.
///
/// Body fields travel as JSON; filters travel in the query string. `None` values are
/// not sent at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobOptions {
    /// Free-text query (query and combined searches).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Exact phrases (keyword and combined searches).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrases: Option<Vec<String>>,

    /// Ask the service to enrich results with extra metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrich: Option<bool>,

    /// URL the service calls when the job completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,

    /// Maximum number of results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Comma-separated fields of study.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields_of_study: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_citation_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_access_pdf: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloadable: Option<bool>,

    /// Comma-separated quartiles (Q1,Q2,...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quartile_ranking: Option<String>,

    /// Comma-separated publication types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_types: Option<String>,

    /// Sort spec as `field:direction`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    /// `YYYY` or `YYYY:YYYY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

/// JSON body half of [`CreateJobOptions`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phrases: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrich: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<&'a str>,
}

impl CreateJobOptions {
    /// Options for a topic search: fixed limit, enrichment and year range.
    #[must_use]
    pub fn for_topic(query: String) -> Self {
        Self {
            query: Some(query),
            enrich: Some(true),
            limit: Some(crate::config::search::RESULT_LIMIT),
            year: Some(crate::config::search::YEAR_RANGE.to_string()),
            ..Self::default()
        }
    }

    /// Split out the JSON body.
    #[must_use]
    pub fn body(&self) -> CreateJobBody<'_> {
        CreateJobBody {
            query: self.query.as_deref(),
            phrases: self.phrases.as_deref(),
            enrich: self.enrich,
            callback_url: self.callback_url.as_deref(),
        }
    }

    /// Query-string filters, skipping unset ones.
    #[must_use]
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(ref fields) = self.fields_of_study {
            params.push(("fieldsOfStudy", fields.clone()));
        }
        if let Some(min) = self.min_citation_count {
            params.push(("minCitationCount", min.to_string()));
        }
        if let Some(open) = self.open_access_pdf {
            params.push(("openAccessPdf", open.to_string()));
        }
        if let Some(downloadable) = self.downloadable {
            params.push(("downloadable", downloadable.to_string()));
        }
        if let Some(ref quartiles) = self.quartile_ranking {
            params.push(("quartileRanking", quartiles.clone()));
        }
        if let Some(ref types) = self.publication_types {
            params.push(("publicationTypes", types.clone()));
        }
        if let Some(ref sort) = self.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(ref year) = self.year {
            params.push(("year", year.clone()));
        }
        params
    }

    /// Check fields the API would otherwise reject with an opaque message.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self, search_type: SearchType) -> Result<(), String> {
        let has_query = self.query.as_deref().is_some_and(|q| !q.trim().is_empty());
        let has_phrases = self.phrases.as_ref().is_some_and(|p| !p.is_empty());

        match search_type {
            SearchType::QuerySearch if !has_query => {
                return Err("querySearch requires a query".to_string());
            }
            SearchType::KeywordSearch if !has_phrases => {
                return Err("keywordSearch requires phrases".to_string());
            }
            SearchType::CombinedSearch if !(has_query && has_phrases) => {
                return Err("combinedSearch requires a query and phrases".to_string());
            }
            _ => {}
        }

        if let Some(ref callback) = self.callback_url {
            url::Url::parse(callback).map_err(|e| format!("invalid callbackUrl: {e}"))?;
        }
        if let Some(ref year) = self.year {
            if !is_year_filter(year) {
                return Err(format!("invalid year filter '{year}', expected YYYY or YYYY:YYYY"));
            }
        }
        Ok(())
    }
}

fn is_year_filter(value: &str) -> bool {
    let is_year = |s: &str| s.len() == 4 && s.chars().all(|c| c.is_ascii_digit());
    match value.split_once(':') {
        Some((from, to)) => is_year(from) && is_year(to) && from <= to,
        None => is_year(value),
    }
}

/// Response from job creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub job_id: JobId,
}

/// Raw job status body as the search API returns it.
///
/// `status` is optional: one API variant omits it once results are ready.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobStatusPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<Paper>>,

    /// Fields the coordinator does not interpret, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl JobStatusPayload {
    /// Fill in `status: "success"` when results arrived without a status.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.status.is_none() && self.results.as_ref().is_some_and(|r| !r.is_empty()) {
            self.status = Some(RemoteStatus::Success.as_str().to_string());
        }
        self
    }

    /// Collapse the payload into a [`JobState`].
    #[must_use]
    pub fn into_state(self) -> JobState {
        let Self { status, results, .. } = self;
        match (status.as_deref().map(RemoteStatus::parse), results) {
            (None, Some(results)) if !results.is_empty() => JobState::Succeeded(results),
            (Some(RemoteStatus::Success), Some(results)) => JobState::Succeeded(results),
            (Some(RemoteStatus::Error), _) => JobState::Failed,
            (Some(RemoteStatus::Queued), _) => JobState::Pending(RemoteStatus::Queued),
            _ => JobState::Pending(RemoteStatus::Processing),
        }
    }
}

/// Status tokens used by the search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    Queued,
    Processing,
    Success,
    Error,
}

impl RemoteStatus {
    /// Parse a status token; unknown tokens count as still processing.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "queued" | "pending" => Self::Queued,
            "success" | "succeeded" | "completed" | "done" => Self::Success,
            "error" | "failed" | "failure" => Self::Error,
            _ => Self::Processing,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Normalized view of a status response.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// Not finished; carries `Queued` or `Processing`.
    Pending(RemoteStatus),
    /// Finished with results.
    Succeeded(Vec<Paper>),
    /// The service reports the job failed.
    Failed,
}
