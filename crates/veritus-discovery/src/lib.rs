//! Veritus Discovery
//!
//! Research paper discovery over the Veritus search API. A topic search is submitted
//! as a remote job, polled with multiplicative backoff until it reaches a terminal
//! state, and the results are normalized into one canonical [`Paper`] shape.
//!
//! # Features
//!
//! - **Job coordinator**: submit, poll as a cancellable event stream, at most one terminal event
//! - **Rate-limit aware**: 429 responses pause polling without touching the backoff
//! - **AI summaries**: OpenAI-compatible completion endpoint with a cached summary path
//! - **HTTP API**: axum routes, cookie registration, SSE poll streams
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use futures::StreamExt;
//! use veritus_discovery::{Caller, Config, JobCoordinator, PollEvent, VeritusClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = VeritusClient::new(&config)?;
//!     let coordinator = JobCoordinator::new(Arc::new(client), config.poll_policy.clone());
//!
//!     let handle = coordinator.submit(&Caller::User("me".into()), "graph neural networks").await?;
//!     let mut session = coordinator.poll(handle);
//!     while let Some(event) = session.next().await {
//!         if let PollEvent::Succeeded(papers) = event {
//!             println!("{} papers", papers.len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod server;
pub mod users;

pub use client::{CompletionClient, VeritusClient};
pub use config::Config;
pub use coordinator::{Caller, JobCoordinator, JobHandle, PollEvent, PollPolicy, PollSession};
pub use error::{ClientError, CompletionError, PollFailure, SubmissionError};
pub use models::Paper;
