//! User registration and sign-up statistics.
//!
//! The store is an explicitly owned object created at start-up and injected into the
//! server; [`MemoryUserStore`] follows the `RwLock<HashMap>` pattern used elsewhere
//! in the crate. Durable storage is left to other [`UserStore`] implementations.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::RegistrationError;
use crate::models::{User, UserStats};

/// Email suffixes treated as academic institutions.
pub const ACADEMIC_DOMAINS: &[&str] = &[
    ".edu",
    ".ac.in",
    ".ac.uk",
    ".ac.jp",
    ".edu.au",
    ".edu.cn",
    ".edu.sg",
    "iit.ac.in",
    "nit.ac.in",
    "iiit.ac.in",
];

/// Number of users listed on the dashboard.
pub const RECENT_USERS_LIMIT: usize = 50;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

/// Whether the address ends with a known academic suffix (case-insensitive).
#[must_use]
pub fn is_academic_email(email: &str) -> bool {
    let lower = email.to_lowercase();
    ACADEMIC_DOMAINS.iter().any(|domain| lower.ends_with(domain))
}

/// Persistence for registered users, keyed by email.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Insert or refresh a user. On insert the given record is stored as is; on
    /// update only `domain`, `is_academic` and `last_seen_at` change.
    async fn upsert(&self, user: User) -> Result<User, RegistrationError>;

    async fn find(&self, id: Uuid) -> Result<Option<User>, RegistrationError>;

    async fn count(&self) -> Result<u64, RegistrationError>;

    async fn count_academic(&self) -> Result<u64, RegistrationError>;

    /// Most recently created users first.
    async fn recent(&self, limit: usize) -> Result<Vec<User>, RegistrationError>;
}

/// In-memory [`UserStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn upsert(&self, user: User) -> Result<User, RegistrationError> {
        let mut users = self.users.write().await;
        let stored = users
            .entry(user.email.clone())
            .and_modify(|existing| {
                existing.domain.clone_from(&user.domain);
                existing.is_academic = user.is_academic;
                existing.last_seen_at = user.last_seen_at;
            })
            .or_insert(user);
        Ok(stored.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, RegistrationError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.id == id).cloned())
    }

    async fn count(&self) -> Result<u64, RegistrationError> {
        Ok(self.users.read().await.len() as u64)
    }

    async fn count_academic(&self) -> Result<u64, RegistrationError> {
        Ok(self.users.read().await.values().filter(|u| u.is_academic).count() as u64)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<User>, RegistrationError> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit);
        Ok(all)
    }
}

/// Registration and dashboard operations over a [`UserStore`].
#[derive(Clone)]
pub struct UserRegistry {
    store: Arc<dyn UserStore>,
}

impl UserRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Register (or re-register) an email address.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidEmail`] for malformed addresses, or a store
    /// error.
    pub async fn register(&self, email: &str) -> Result<User, RegistrationError> {
        let email = email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(RegistrationError::InvalidEmail);
        }

        let domain = email.split_once('@').map(|(_, d)| d).unwrap_or_default();
        let is_academic = is_academic_email(email);

        let user = self.store.upsert(User::new(email, domain, is_academic)).await?;
        tracing::info!(user_id = %user.id, domain = %user.domain, is_academic, "User registered");
        Ok(user)
    }

    /// Look up a user by id.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn find(&self, id: Uuid) -> Result<Option<User>, RegistrationError> {
        self.store.find(id).await
    }

    /// Dashboard statistics against an academic sign-up goal.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn stats(&self, goal: u64) -> Result<UserStats, RegistrationError> {
        let total_users = self.store.count().await?;
        let academic_users = self.store.count_academic().await?;
        let recent_users = self.store.recent(RECENT_USERS_LIMIT).await?;

        let academic_rate = if total_users == 0 {
            0.0
        } else {
            academic_users as f64 / total_users as f64 * 100.0
        };
        let goal_progress = if goal == 0 {
            100.0
        } else {
            (academic_users as f64 / goal as f64 * 100.0).min(100.0)
        };

        Ok(UserStats {
            total_users,
            academic_users,
            academic_rate,
            goal,
            goal_progress,
            remaining_to_goal: goal.saturating_sub(academic_users),
            recent_users,
        })
    }
}

impl std::fmt::Debug for UserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRegistry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> UserRegistry {
        UserRegistry::new(Arc::new(MemoryUserStore::new()))
    }

    #[test]
    fn test_academic_domains() {
        assert!(is_academic_email("ada@cs.stanford.edu"));
        assert!(is_academic_email("RAVI@IITB.AC.IN"));
        assert!(is_academic_email("li@pku.edu.cn"));
        assert!(is_academic_email("tom@ox.ac.uk"));
        assert!(!is_academic_email("someone@gmail.com"));
        assert!(!is_academic_email("edu@example.com"));
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_email() {
        let registry = registry();
        for bad in ["", "no-at-sign", "a@b", "two words@x.edu"] {
            assert!(matches!(registry.register(bad).await, Err(RegistrationError::InvalidEmail)));
        }
    }

    #[tokio::test]
    async fn test_register_upserts_by_email() {
        let registry = registry();
        let first = registry.register("grace@mit.edu").await.unwrap();
        assert!(first.is_academic);
        assert_eq!(first.domain, "mit.edu");

        let second = registry.register("grace@mit.edu").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert!(second.last_seen_at >= first.last_seen_at);

        let stats = registry.stats(42).await.unwrap();
        assert_eq!(stats.total_users, 1);
    }

    #[tokio::test]
    async fn test_stats() {
        let registry = registry();
        let empty = registry.stats(42).await.unwrap();
        assert_eq!(empty.academic_rate, 0.0);
        assert_eq!(empty.remaining_to_goal, 42);

        registry.register("a@uni.ac.uk").await.unwrap();
        registry.register("b@gmail.com").await.unwrap();
        registry.register("c@gmail.com").await.unwrap();
        registry.register("d@iitd.ac.in").await.unwrap();

        let stats = registry.stats(2).await.unwrap();
        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.academic_users, 2);
        assert!((stats.academic_rate - 50.0).abs() < f64::EPSILON);
        assert!((stats.goal_progress - 100.0).abs() < f64::EPSILON);
        assert_eq!(stats.remaining_to_goal, 0);
        assert_eq!(stats.recent_users.len(), 4);
        assert!(stats
            .recent_users
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let registry = registry();
        let user = registry.register("x@nus.edu.sg").await.unwrap();
        assert_eq!(registry.find(user.id).await.unwrap(), Some(user));
        assert_eq!(registry.find(Uuid::new_v4()).await.unwrap(), None);
    }
}
