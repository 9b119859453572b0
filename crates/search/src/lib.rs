//! Client for a remote search service that runs jobs asynchronously.
//!
//! A job is created from either a saved search (by name) or a raw query,
//! polled until it reports completion or a local wait budget runs out, and
//! then its rows are fetched. The client also lists saved searches, describes
//! one, reads server metadata and summarises recent jobs and indexes.
//!
//! [`SearchBackend`] is the seam the bot dispatches through; [`SearchClient`]
//! is its HTTP implementation.

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use backend::{DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL, SearchBackend, WaitPolicy};
pub use client::{SearchClient, saved_search_query};
pub use config::{DEFAULT_TIMEOUT, SearchConfig};
pub use error::SearchError;
pub use types::{
    IndexSummary, JobRun, JobState, JobSummary, Row, SavedSearch, SearchInfo, ServerInfo,
    TimeRange,
};
