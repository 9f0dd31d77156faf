//! Registered user model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user who registered with an email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier, also stored in the user cookie.
    pub id: Uuid,

    /// Email address; unique key for upserts.
    pub email: String,

    /// Part of the email after `@`.
    pub domain: String,

    /// Whether the email belongs to a known academic domain.
    pub is_academic: bool,

    pub created_at: DateTime<Utc>,

    pub last_seen_at: DateTime<Utc>,
}

impl User {
    /// Create a new user record stamped with the current time.
    #[must_use]
    pub fn new(email: impl Into<String>, domain: impl Into<String>, is_academic: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            domain: domain.into(),
            is_academic,
            created_at: now,
            last_seen_at: now,
        }
    }
}

/// Aggregate sign-up statistics for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: u64,
    pub academic_users: u64,
    /// Academic share of all users, in percent.
    pub academic_rate: f64,
    pub goal: u64,
    /// Progress toward `goal`, in percent, capped at 100.
    pub goal_progress: f64,
    pub remaining_to_goal: u64,
    pub recent_users: Vec<User>,
}
