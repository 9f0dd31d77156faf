//! Registry of active polling sessions.
//!
//! Keeps at most one live session per (caller, job). Starting a new one cancels the
//! previous session for the same key, so a reconnecting browser tab never ends up
//! with two pollers for one job.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::coordinator::CancelHandle;
use crate::models::JobId;

type SessionKey = (String, JobId);

/// Active poll sessions keyed by caller id and job.
#[derive(Debug, Default)]
pub struct ActivePolls {
    sessions: Mutex<HashMap<SessionKey, CancelHandle>>,
}

impl ActivePolls {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new session, cancelling any earlier one for the same key.
    ///
    /// Returns true if an earlier session was replaced.
    pub async fn register(&self, caller_id: &str, job_id: &JobId, handle: CancelHandle) -> bool {
        let mut sessions = self.sessions.lock().await;
        // Dropped sessions cancel themselves; forget them here.
        sessions.retain(|_, h| !h.is_cancelled());

        let previous = sessions.insert((caller_id.to_string(), job_id.clone()), handle);
        if let Some(ref previous) = previous {
            tracing::debug!(caller_id, %job_id, "Replacing active polling session");
            previous.cancel();
        }
        previous.is_some()
    }

    /// Number of sessions that are still live.
    pub async fn active_count(&self) -> usize {
        self.sessions.lock().await.values().filter(|h| !h.is_cancelled()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_session_replaces_previous() {
        let polls = ActivePolls::new();
        let job = JobId::new("job-1");
        let first = CancelHandle::new();
        let second = CancelHandle::new();

        assert!(!polls.register("user-1", &job, first.clone()).await);
        assert!(polls.register("user-1", &job, second.clone()).await);

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(polls.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_keyed_per_caller_and_job() {
        let polls = ActivePolls::new();
        let a = CancelHandle::new();
        let b = CancelHandle::new();
        let c = CancelHandle::new();

        polls.register("user-1", &JobId::new("job-1"), a.clone()).await;
        polls.register("user-2", &JobId::new("job-1"), b.clone()).await;
        polls.register("user-1", &JobId::new("job-2"), c.clone()).await;
        assert_eq!(polls.active_count().await, 3);

        b.cancel();
        assert_eq!(polls.active_count().await, 2);
        assert!(!a.is_cancelled());
    }
}
