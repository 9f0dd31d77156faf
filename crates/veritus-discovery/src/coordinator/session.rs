//! A single job's polling session.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use futures::stream::BoxStream;
use tokio::sync::watch;

use super::backoff::{Backoff, PollPolicy};
use super::{JobService, PollEvent};
use crate::error::PollFailure;
use crate::models::{JobId, JobState};

/// Cancels a polling session from anywhere. Cloneable; cancelling twice is a no-op.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Stop the session. No scheduled request fires and no event is delivered afterwards.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // Err means every sender is gone, which only happens once the session is dropped.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Lazy, finite stream of [`PollEvent`]s for one job.
///
/// Ends after `Succeeded` or `Failed`, or as soon as it is cancelled. Dropping the
/// session cancels it.
pub struct PollSession {
    job_id: JobId,
    cancel: CancelHandle,
    inner: BoxStream<'static, PollEvent>,
    finished: bool,
}

impl PollSession {
    pub(super) fn start(service: Arc<dyn JobService>, job_id: JobId, policy: PollPolicy) -> Self {
        let cancel = CancelHandle::new();
        let inner = Box::pin(poll_events(service, job_id.clone(), policy, cancel.clone()));
        Self { job_id, cancel, inner, finished: false }
    }

    #[must_use]
    pub const fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Handle that can cancel this session from another task.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Cancel this session.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Stream for PollSession {
    type Item = PollEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished || self.cancel.is_cancelled() {
            self.finished = true;
            return Poll::Ready(None);
        }

        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(event)) => {
                if self.cancel.is_cancelled() {
                    self.finished = true;
                    return Poll::Ready(None);
                }
                if event.is_terminal() {
                    self.finished = true;
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(job_id = %self.job_id, "Polling session dropped before completion");
        }
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for PollSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollSession")
            .field("job_id", &self.job_id)
            .field("finished", &self.finished)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Sleep for `delay`, returning `false` if the session was cancelled meanwhile.
async fn wait(delay: Duration, cancel: &CancelHandle) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(delay) => !cancel.is_cancelled(),
    }
}

fn poll_events(
    service: Arc<dyn JobService>,
    job_id: JobId,
    policy: PollPolicy,
    cancel: CancelHandle,
) -> impl Stream<Item = PollEvent> + Send + 'static {
    async_stream::stream! {
        let mut backoff = Backoff::new(&policy);
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                break;
            }
            if policy.max_attempts.is_some_and(|max| attempt >= max) {
                tracing::warn!(%job_id, attempt, "Polling attempt budget exhausted");
                yield PollEvent::Failed(PollFailure::Transient(format!(
                    "Gave up after {attempt} attempts"
                )));
                break;
            }
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                result = service.job_status(&job_id) => Some(result),
            };
            let Some(outcome) = outcome else {
                tracing::debug!(%job_id, attempt, "Cancelled with status request in flight");
                break;
            };
            if cancel.is_cancelled() {
                break;
            }

            match outcome {
                Err(err) if err.is_rate_limited() => {
                    tracing::warn!(
                        %job_id,
                        attempt,
                        delay_ms = policy.rate_limit_delay.as_millis() as u64,
                        "Status check rate limited, retrying"
                    );
                    if !wait(policy.rate_limit_delay, &cancel).await {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!(%job_id, attempt, error = %err, "Status check failed");
                    yield PollEvent::Failed(PollFailure::Transient(format!(
                        "Failed to check job status: {err}"
                    )));
                    break;
                }
                Ok(payload) => match payload.into_state() {
                    JobState::Succeeded(results) => {
                        tracing::info!(%job_id, attempt, results = results.len(), "Search job succeeded");
                        yield PollEvent::Succeeded(results);
                        break;
                    }
                    JobState::Failed => {
                        tracing::warn!(%job_id, attempt, "Search job reported failure");
                        yield PollEvent::Failed(PollFailure::RemoteJob);
                        break;
                    }
                    JobState::Pending(status) => {
                        let delay = backoff.current();
                        tracing::debug!(
                            %job_id,
                            attempt,
                            status = status.as_str(),
                            delay_ms = delay.as_millis() as u64,
                            "Search job pending"
                        );
                        yield PollEvent::Pending { status, attempt, next_poll_in: delay };
                        if !wait(delay, &cancel).await {
                            break;
                        }
                        backoff.advance();
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientResult;
    use crate::models::{CreateJobOptions, JobStatusPayload, SearchType};
    use tokio_test::{assert_pending, assert_ready_eq, task};

    /// Service whose status request never completes.
    struct Stalled;

    #[async_trait::async_trait]
    impl JobService for Stalled {
        async fn create_job(&self, _: SearchType, _: &CreateJobOptions) -> ClientResult<JobId> {
            Ok(JobId::new("stalled"))
        }

        async fn job_status(&self, _: &JobId) -> ClientResult<JobStatusPayload> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancel_wakes_and_ends_stream() {
        let mut session =
            task::spawn(PollSession::start(Arc::new(Stalled), JobId::new("j"), PollPolicy::default()));
        let cancel = session.cancel_handle();

        assert_pending!(session.poll_next());

        cancel.cancel();
        assert!(session.is_woken());
        assert_ready_eq!(session.poll_next(), None);
        assert_ready_eq!(session.poll_next(), None);
    }
}
