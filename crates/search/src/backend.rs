use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::SearchError;
use crate::types::{
    IndexSummary, JobRun, JobState, JobSummary, Row, SavedSearch, SearchInfo, ServerInfo,
    TimeRange,
};

/// Default local wait budget for a job.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(35);

/// Default pause between two status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// How long to wait on a job and how often to ask about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            max_wait: DEFAULT_MAX_WAIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitPolicy {
    pub fn new(max_wait: Duration, poll_interval: Duration) -> Self {
        Self {
            max_wait,
            poll_interval,
        }
    }
}

/// Operations the bot needs from the search backend.
///
/// [`SearchClient`](crate::SearchClient) talks to the real API; tests supply
/// scripted implementations. None of the methods check authorization, and
/// none retry.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Create a job that runs the named saved search. Returns the job id.
    async fn dispatch_saved_search(
        &self,
        name: &str,
        range: &TimeRange,
    ) -> Result<String, SearchError>;

    /// Create a job from caller-supplied query text, sent verbatim.
    async fn run_raw_query(&self, query: &str, range: &TimeRange) -> Result<String, SearchError>;

    /// Ask once whether the job has completed.
    async fn job_is_done(&self, sid: &str) -> Result<bool, SearchError>;

    /// Fetch up to `count` result rows. Does not check that the job is done.
    async fn get_results(&self, sid: &str, count: usize) -> Result<Vec<Row>, SearchError>;

    /// List saved searches, keeping those whose name contains `contains`
    /// (case-insensitive) when given.
    async fn list_saved_searches(
        &self,
        contains: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SavedSearch>, SearchError>;

    /// Describe one saved search. Fails with [`SearchError::NotFound`] when
    /// the backend answers with an error status.
    async fn get_search_info(&self, name: &str) -> Result<SearchInfo, SearchError>;

    /// Version and role probe.
    async fn get_server_info(&self) -> Result<ServerInfo, SearchError>;

    /// List recent jobs.
    async fn list_jobs(&self, count: usize) -> Result<Vec<JobSummary>, SearchError>;

    /// List indexes, largest first, hiding empty internal ones.
    async fn list_indexes(&self, count: usize) -> Result<Vec<IndexSummary>, SearchError>;

    /// Poll the job on a fixed interval until it reports done or the wait
    /// budget runs out. Returns whether completion was observed.
    ///
    /// A timeout leaves the job running on the server.
    async fn wait_for_job(&self, sid: &str, policy: &WaitPolicy) -> Result<bool, SearchError> {
        let start = tokio::time::Instant::now();
        let mut polls = 0u32;

        while start.elapsed() < policy.max_wait {
            polls += 1;
            if self.job_is_done(sid).await? {
                debug!(sid, polls, "job reported done");
                return Ok(true);
            }
            tokio::time::sleep(policy.poll_interval).await;
        }

        info!(
            sid,
            polls,
            budget_ms = u64::try_from(policy.max_wait.as_millis()).unwrap_or(u64::MAX),
            "job did not finish within the wait budget"
        );
        Ok(false)
    }

    /// Wait on an already dispatched job and fetch up to `count` rows if it
    /// finished in time.
    async fn collect_job(
        &self,
        sid: String,
        policy: &WaitPolicy,
        count: usize,
    ) -> Result<JobRun, SearchError> {
        if !self.wait_for_job(&sid, policy).await? {
            return Ok(JobRun {
                sid,
                state: JobState::TimedOut,
                rows: Vec::new(),
            });
        }
        let rows = self.get_results(&sid, count).await?;
        Ok(JobRun {
            sid,
            state: JobState::Done,
            rows,
        })
    }
}
