//! HTTP API.
//!
//! Thin axum front end over the job coordinator, the Veritus client, the completion
//! client and the user registry. Every collaborator is built once from [`Config`]
//! and shared through [`AppState`].

mod auth;
mod error;
mod routes;
mod sessions;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use auth::{COOKIE_MAX_AGE_SECS, caller_from_jar, user_cookie};
pub use error::ApiError;
pub use sessions::ActivePolls;

use crate::client::{CompletionClient, VeritusClient};
use crate::config::{Config, api};
use crate::coordinator::JobCoordinator;
use crate::users::{MemoryUserStore, UserRegistry};

/// Shared state for HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub veritus: VeritusClient,
    pub coordinator: JobCoordinator,
    pub completion: CompletionClient,
    pub users: UserRegistry,
    pub polls: ActivePolls,
}

impl AppState {
    /// Build every collaborator from configuration, with an in-memory user store.
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be built.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let users = UserRegistry::new(Arc::new(MemoryUserStore::new()));
        Self::with_users(config, users)
    }

    /// Build the state around an existing user registry.
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be built.
    pub fn with_users(config: Config, users: UserRegistry) -> anyhow::Result<Self> {
        let veritus = VeritusClient::new(&config)?;
        let coordinator = JobCoordinator::new(Arc::new(veritus.clone()), config.poll_policy.clone());
        let completion = CompletionClient::new(&config)?;

        Ok(Self { config, veritus, coordinator, completion, users, polls: ActivePolls::new() })
    }
}

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/auth/status", get(routes::auth_status))
        .route("/api/auth/register", post(routes::register))
        .route("/api/jobs/create", post(routes::create_job))
        .route("/api/jobs/{job_id}", get(routes::job_status))
        .route("/api/topics/search", post(routes::topic_search))
        .route("/api/topics/{job_id}/events", get(routes::topic_events))
        .route("/api/papers/search", get(routes::search_papers))
        .route("/api/papers/summarize", post(routes::summarize))
        .route("/api/papers/review", post(routes::review))
        .route("/api/papers/{id}", get(routes::get_paper))
        .route("/api/trending/topics", get(routes::trending_topics))
        .route("/api/trending/papers", get(routes::trending_papers))
        .route("/api/admin/stats", get(routes::admin_stats))
        .layer(GlobalConcurrencyLimitLayer::new(api::MAX_CONCURRENT_REQUESTS))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the HTTP API until Ctrl-C.
///
/// # Errors
///
/// Returns error if the state cannot be built or the listener fails.
pub async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(config)?);
    if !state.veritus.has_api_key() {
        tracing::warn!("No Veritus API key configured");
    }

    let router = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("HTTP server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
