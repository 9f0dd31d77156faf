//! Job lifecycle coordinator.
//!
//! Submits a topic search to the search service and follows the job to a terminal
//! state:
//!
//! ```text
//! queued/processing --pending-------------> queued/processing  (sleep backoff, grow it)
//! queued/processing --429-----------------> queued/processing  (sleep 15s, backoff untouched)
//! queued/processing --success-------------> success            (terminal)
//! queued/processing --explicit error------> error              (terminal)
//! queued/processing --other failure-------> error              (terminal)
//! ```
//!
//! Each [`PollSession`] delivers at most one terminal event and nothing after it.
//! Sessions share no state; submitting the same topic twice creates two jobs.

mod backoff;
mod session;

use std::sync::Arc;
use std::time::Duration;

pub use backoff::{Backoff, PollPolicy};
pub use session::{CancelHandle, PollSession};

use crate::client::VeritusClient;
use crate::config::search;
use crate::error::{ClientResult, PollFailure, SubmissionError};
use crate::models::{CreateJobOptions, JobId, JobStatusPayload, Paper, RemoteStatus, SearchType};

/// The two search-service endpoints the coordinator depends on.
#[async_trait::async_trait]
pub trait JobService: Send + Sync {
    /// Create a job and return its identifier.
    async fn create_job(
        &self,
        search_type: SearchType,
        options: &CreateJobOptions,
    ) -> ClientResult<JobId>;

    /// Fetch the raw status of a job.
    async fn job_status(&self, job_id: &JobId) -> ClientResult<JobStatusPayload>;
}

#[async_trait::async_trait]
impl JobService for VeritusClient {
    async fn create_job(
        &self,
        search_type: SearchType,
        options: &CreateJobOptions,
    ) -> ClientResult<JobId> {
        Self::create_job(self, search_type, options).await
    }

    async fn job_status(&self, job_id: &JobId) -> ClientResult<JobStatusPayload> {
        Self::job_status(self, job_id).await
    }
}

/// Who is asking for a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    /// Registered user, identified by the id stored in their cookie.
    User(String),
}

impl Caller {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

/// A submitted job, ready to be polled once.
#[derive(Debug, PartialEq, Eq)]
pub struct JobHandle {
    job_id: JobId,
}

impl JobHandle {
    /// Wrap a job id obtained elsewhere (e.g. from a URL) so it can be polled.
    #[must_use]
    pub fn from_id(job_id: JobId) -> Self {
        Self { job_id }
    }

    #[must_use]
    pub const fn job_id(&self) -> &JobId {
        &self.job_id
    }
}

/// Event produced by a [`PollSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// Job not finished yet.
    Pending {
        /// Status reported by the service.
        status: RemoteStatus,
        /// 1-based number of the status request that produced this event.
        attempt: u32,
        /// Delay before the next status request.
        next_poll_in: Duration,
    },
    /// Job finished; terminal.
    Succeeded(Vec<Paper>),
    /// Job failed or could not be checked; terminal.
    Failed(PollFailure),
}

impl PollEvent {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending { .. })
    }
}

/// Owns the lifecycle of search jobs from submission to terminal state.
#[derive(Clone)]
pub struct JobCoordinator {
    service: Arc<dyn JobService>,
    policy: PollPolicy,
}

impl JobCoordinator {
    #[must_use]
    pub fn new(service: Arc<dyn JobService>, policy: PollPolicy) -> Self {
        Self { service, policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Submit a topic search on behalf of `caller`.
    ///
    /// The topic is wrapped into a fixed query template and searched with a fixed
    /// result limit, enrichment, and year range.
    ///
    /// # Errors
    ///
    /// Fails if the caller is anonymous, the topic is blank, or the search service
    /// rejects the request or cannot be reached.
    pub async fn submit(&self, caller: &Caller, topic: &str) -> Result<JobHandle, SubmissionError> {
        if !caller.is_authenticated() {
            return Err(SubmissionError::Unauthenticated);
        }

        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SubmissionError::EmptyTopic);
        }

        let options = CreateJobOptions::for_topic(search::query_for_topic(topic));
        let job_id = self
            .service
            .create_job(SearchType::QuerySearch, &options)
            .await
            .map_err(|err| {
                tracing::error!(topic, error = %err, "Job submission failed");
                SubmissionError::from(err)
            })?;

        tracing::info!(topic, %job_id, "Submitted topic search");
        Ok(JobHandle { job_id })
    }

    /// Start polling a submitted job. The handle is consumed; a session cannot be
    /// restarted.
    #[must_use]
    pub fn poll(&self, handle: JobHandle) -> PollSession {
        PollSession::start(Arc::clone(&self.service), handle.job_id, self.policy.clone())
    }
}

impl std::fmt::Debug for JobCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobCoordinator").field("policy", &self.policy).finish()
    }
}
