use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::backend::SearchBackend;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::types::{
    Feed, IndexSummary, JobSummary, ResultsResponse, Row, SavedSearch, SearchInfo, ServerInfo,
    TimeRange, extract_sid, f64_field, is_done_flag, str_field, u64_field,
};

/// HTTP client for the search-job API.
///
/// Every request carries the configured `Authorization` header, asks for
/// JSON output and is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct SearchClient {
    config: SearchConfig,
    client: Client,
}

impl SearchClient {
    /// Build a client from configuration.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchError::Configuration(e.to_string()))?;

        if !config.verify_tls {
            warn!(base_url = %config.base_url, "TLS certificate verification is disabled");
        }

        Ok(Self { config, client })
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_client(config: SearchConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(self.url(path))
            .header(reqwest::header::AUTHORIZATION, self.config.authorization())
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("output_mode", "json")])
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.url(path))
            .header(reqwest::header::AUTHORIZATION, self.config.authorization())
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("output_mode", "json")])
    }

    /// Turn any status of 400 or above into [`SearchError::Status`].
    async fn check(response: Response) -> Result<Response, SearchError> {
        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SearchError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| SearchError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, SearchError> {
        let response = Self::check(request.send().await?).await?;
        Self::decode(response).await
    }

    /// `POST /services/search/jobs` with the given query text.
    async fn create_job(&self, query: &str, range: &TimeRange) -> Result<String, SearchError> {
        let form = [
            ("search", query),
            ("earliest_time", range.earliest.as_str()),
            ("latest_time", range.latest.as_str()),
            ("exec_mode", "normal"),
        ];

        let response = self
            .post("/services/search/jobs")
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Dispatch(format!(
                "job creation failed ({}): {body}",
                status.as_u16()
            )));
        }

        let payload: serde_json::Value = Self::decode(response).await.map_err(|e| match e {
            SearchError::Decode(msg) => SearchError::Dispatch(format!("unreadable response: {msg}")),
            other => other,
        })?;

        let sid = extract_sid(&payload).ok_or_else(|| {
            SearchError::Dispatch(format!("no job id in response: {payload}"))
        })?;
        debug!(sid = %sid, "job created");
        Ok(sid)
    }
}

/// Percent-encode a value for use as a single path segment.
fn segment(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// Query text that runs a saved search by reference.
pub fn saved_search_query(name: &str) -> String {
    format!("| savedsearch \"{name}\"")
}

#[async_trait]
impl SearchBackend for SearchClient {
    #[instrument(skip(self, range), fields(earliest = %range.earliest, latest = %range.latest))]
    async fn dispatch_saved_search(
        &self,
        name: &str,
        range: &TimeRange,
    ) -> Result<String, SearchError> {
        self.create_job(&saved_search_query(name), range).await
    }

    #[instrument(skip(self, query, range), fields(query_len = query.len()))]
    async fn run_raw_query(&self, query: &str, range: &TimeRange) -> Result<String, SearchError> {
        self.create_job(query, range).await
    }

    async fn job_is_done(&self, sid: &str) -> Result<bool, SearchError> {
        let path = format!("/services/search/jobs/{}", segment(sid));
        let feed: Feed = self.get_json(self.get(&path)).await?;
        let entry = feed.into_first();
        Ok(is_done_flag(entry.content.get("isDone")))
    }

    #[instrument(skip(self))]
    async fn get_results(&self, sid: &str, count: usize) -> Result<Vec<Row>, SearchError> {
        let path = format!("/services/search/jobs/{}/results", segment(sid));
        let response: ResultsResponse = self
            .get_json(self.get(&path).query(&[("count", count)]))
            .await?;
        Ok(response.results)
    }

    #[instrument(skip(self))]
    async fn list_saved_searches(
        &self,
        contains: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SavedSearch>, SearchError> {
        let feed: Feed = self
            .get_json(
                self.get("/servicesNS/-/-/saved/searches")
                    .query(&[("count", limit)]),
            )
            .await?;

        let needle = contains.map(str::to_lowercase);
        Ok(feed
            .entry
            .into_iter()
            .filter(|e| {
                needle
                    .as_deref()
                    .is_none_or(|n| e.name.to_lowercase().contains(n))
            })
            .map(|e| SavedSearch {
                description: str_field(&e.content, "description"),
                name: e.name,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_search_info(&self, name: &str) -> Result<SearchInfo, SearchError> {
        let path = format!("/servicesNS/-/-/saved/searches/{}", segment(name));
        let response = self.get(&path).send().await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(SearchError::NotFound(format!(
                "{name} ({})",
                status.as_u16()
            )));
        }

        let feed: Feed = Self::decode(response).await?;
        let entry = feed.into_first();
        let app = entry
            .content
            .get("eai:acl")
            .and_then(|acl| acl.get("app"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned();

        Ok(SearchInfo {
            description: str_field(&entry.content, "description"),
            query: str_field(&entry.content, "search"),
            owner: str_field(&entry.content, "owner"),
            updated: str_field(&entry.content, "updated"),
            app,
            name: entry.name,
        })
    }

    #[instrument(skip(self))]
    async fn get_server_info(&self) -> Result<ServerInfo, SearchError> {
        let feed: Feed = self.get_json(self.get("/services/server/info")).await?;
        let entry = feed.into_first();
        let roles = entry
            .content
            .get("server_roles")
            .and_then(serde_json::Value::as_array)
            .map(|roles| {
                roles
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ServerInfo {
            version: str_field(&entry.content, "version"),
            build: str_field(&entry.content, "build"),
            roles,
        })
    }

    #[instrument(skip(self))]
    async fn list_jobs(&self, count: usize) -> Result<Vec<JobSummary>, SearchError> {
        let feed: Feed = self
            .get_json(self.get("/services/search/jobs").query(&[("count", count)]))
            .await?;

        Ok(feed
            .entry
            .into_iter()
            .map(|e| JobSummary {
                sid: str_field(&e.content, "sid"),
                is_done: is_done_flag(e.content.get("isDone")),
                run_duration: f64_field(&e.content, "runDuration"),
                event_count: u64_field(&e.content, "eventCount"),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_indexes(&self, count: usize) -> Result<Vec<IndexSummary>, SearchError> {
        let feed: Feed = self
            .get_json(self.get("/services/data/indexes").query(&[("count", count)]))
            .await?;

        let mut indexes: Vec<IndexSummary> = feed
            .entry
            .into_iter()
            .map(|e| IndexSummary {
                total_event_count: u64_field(&e.content, "totalEventCount"),
                name: e.name,
            })
            .filter(|idx| !idx.name.starts_with('_') || idx.total_event_count > 0)
            .collect();
        indexes.sort_by(|a, b| b.total_event_count.cmp(&a.total_event_count));
        Ok(indexes)
    }
}
