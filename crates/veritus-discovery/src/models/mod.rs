//! Data models for the Veritus API and the local user registry.
//!
//! Wire models use `#[serde(rename_all = "camelCase")]` to match API naming;
//! optional fields default so partial payloads still decode.

mod job;
mod paper;
mod user;

pub use job::{
    CreateJobBody, CreateJobOptions, CreateJobResponse, JobId, JobState, JobStatusPayload,
    RemoteStatus, SearchType,
};
pub use paper::{ImpactFactor, Paper};
pub use user::{User, UserStats};
