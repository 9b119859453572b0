use spyglass_audit::{Actor, AuditAction, AuditResult};
use spyglass_search::{JobState, TimeRange};
use tracing::info;

use crate::args::preview;
use crate::bot::{Bot, EXECUTED_PREVIEW_LEN};
use crate::command::RAW_QUERY_COMMAND;
use crate::error::BotError;
use crate::format::{
    format_indexes, format_jobs, format_results, format_saved_searches, format_search_info,
    format_server_info, format_timeout,
};

/// Title used for raw query results.
const RAW_QUERY_TITLE: &str = "SPL query";
const INDEX_FETCH_COUNT: usize = 50;
const JOB_FETCH_COUNT: usize = 20;

impl Bot {
    /// Dispatch a saved search, wait for it, and render its rows.
    pub(crate) async fn search_alert(
        &self,
        name: &str,
        range: &TimeRange,
        limit: Option<usize>,
    ) -> Result<String, BotError> {
        let limit = limit.unwrap_or_else(|| self.result_limit());
        let sid = self.backend.dispatch_saved_search(name, range).await?;
        info!(search = name, sid = %sid, "saved search dispatched");

        let run = self
            .backend
            .collect_job(sid, &self.settings.wait, limit)
            .await?;
        Ok(match run.state {
            JobState::Done => format_results(name, &run.sid, &run.rows),
            _ => format_timeout(name, &run.sid),
        })
    }

    pub(crate) async fn search_list(
        &self,
        contains: Option<&str>,
        limit: usize,
    ) -> Result<String, BotError> {
        let searches = self.backend.list_saved_searches(contains, limit).await?;
        Ok(format_saved_searches(contains, &searches, limit))
    }

    pub(crate) async fn search_info(&self, name: &str) -> Result<String, BotError> {
        let info = self.backend.get_search_info(name).await?;
        Ok(format_search_info(&info))
    }

    /// Run a caller-supplied query. The caller has already passed the
    /// raw-query gate; the outcome is recorded either way.
    pub(crate) async fn raw_query(&self, actor: &Actor, query: &str) -> Result<String, BotError> {
        let limit = self.result_limit();
        let outcome = async {
            let sid = self
                .backend
                .run_raw_query(query, &TimeRange::default())
                .await?;
            self.backend
                .collect_job(sid, &self.settings.wait, limit)
                .await
        }
        .await;

        match outcome {
            Ok(run) => {
                let finished = run.state == JobState::Done;
                self.record(
                    actor,
                    AuditAction::new(RAW_QUERY_COMMAND, "Executed SPL query", AuditResult::Success)
                        .with_change("channel", actor.channel_id.clone())
                        .with_change("query_preview", preview(query, EXECUTED_PREVIEW_LEN))
                        .with_change("sid", run.sid.clone())
                        .with_change("finished", finished),
                )
                .await;
                Ok(if finished {
                    format_results(RAW_QUERY_TITLE, &run.sid, &run.rows)
                } else {
                    format!(
                        "⚠️ Query started but did not finish in time.\n• SID: `{}`",
                        run.sid
                    )
                })
            }
            Err(e) => {
                self.record(
                    actor,
                    AuditAction::new(RAW_QUERY_COMMAND, "SPL query failed", AuditResult::Failed)
                        .with_change("channel", actor.channel_id.clone())
                        .with_change("query_preview", preview(query, EXECUTED_PREVIEW_LEN))
                        .with_error(e.to_string()),
                )
                .await;
                Err(e.into())
            }
        }
    }

    pub(crate) async fn search_jobs(&self) -> Result<String, BotError> {
        let jobs = self.backend.list_jobs(JOB_FETCH_COUNT).await?;
        Ok(format_jobs(&jobs))
    }

    pub(crate) async fn indexes(&self) -> Result<String, BotError> {
        let indexes = self.backend.list_indexes(INDEX_FETCH_COUNT).await?;
        Ok(format_indexes(&indexes))
    }

    pub(crate) async fn server_status(&self) -> Result<String, BotError> {
        let info = self.backend.get_server_info().await?;
        Ok(format_server_info(&info))
    }
}
