use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use spyglass_search::{
    IndexSummary, JobSummary, Row, SavedSearch, SearchBackend, SearchError, SearchInfo,
    ServerInfo, TimeRange,
};
use spyglass_server::api::{AppState, router};
use spyglass_server::config::SpyglassConfig;
use spyglass_server::factory::{Secrets, build_bot};
use spyglass_slack::{SlackClient, SlackConfig};

/// Backend that only answers the server-info probe.
struct InfoOnly;

fn offline() -> SearchError {
    SearchError::Configuration("offline".into())
}

#[async_trait]
impl SearchBackend for InfoOnly {
    async fn dispatch_saved_search(&self, _: &str, _: &TimeRange) -> Result<String, SearchError> {
        Err(offline())
    }

    async fn run_raw_query(&self, _: &str, _: &TimeRange) -> Result<String, SearchError> {
        Err(offline())
    }

    async fn job_is_done(&self, _: &str) -> Result<bool, SearchError> {
        Err(offline())
    }

    async fn get_results(&self, _: &str, _: usize) -> Result<Vec<Row>, SearchError> {
        Err(offline())
    }

    async fn list_saved_searches(
        &self,
        _: Option<&str>,
        _: usize,
    ) -> Result<Vec<SavedSearch>, SearchError> {
        Err(offline())
    }

    async fn get_search_info(&self, _: &str) -> Result<SearchInfo, SearchError> {
        Err(offline())
    }

    async fn get_server_info(&self) -> Result<ServerInfo, SearchError> {
        Ok(ServerInfo {
            version: "9.2.1".into(),
            build: "deadbeef".into(),
            roles: vec!["indexer".into()],
        })
    }

    async fn list_jobs(&self, _: usize) -> Result<Vec<JobSummary>, SearchError> {
        Err(offline())
    }

    async fn list_indexes(&self, _: usize) -> Result<Vec<IndexSummary>, SearchError> {
        Err(offline())
    }
}

async fn state(dir: &tempfile::TempDir, slack: bool) -> AppState {
    let env_file = dir.path().join(".env");
    std::fs::write(&env_file, "# roster\nADMIN_USER_IDS=U1\n").unwrap();
    let config = SpyglassConfig::from_toml(&format!(
        "[bot]\nenv_file = {:?}\n[audit]\nbackend = \"memory\"\nexport_dir = {:?}\n",
        env_file.display().to_string(),
        dir.path().display().to_string(),
    ))
    .unwrap();

    let bot = build_bot(&config, &Secrets::default(), Arc::new(InfoOnly))
        .await
        .unwrap();
    let slack = slack.then(|| {
        let config = SlackConfig::new("xoxb-test").with_api_base_url("http://127.0.0.1:1");
        Arc::new(SlackClient::new(config).unwrap())
    });
    AppState {
        bot: Arc::new(bot),
        slack,
    }
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(state(&dir, false).await);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn commands_return_replies() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(state(&dir, false).await);

    let response = app
        .oneshot(post_json(
            "/commands",
            &json!({ "user_id": "U1", "channel_id": "C1", "text": "!splunk-status" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let replies = body["replies"].as_array().unwrap();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].as_str().unwrap().contains("9.2.1"));
}

#[tokio::test]
async fn plain_text_gets_no_reply() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(state(&dir, false).await);

    let response = app
        .oneshot(post_json(
            "/commands",
            &json!({ "user_id": "U1", "channel_id": "C1", "text": "good morning" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["replies"], json!([]));
}

#[tokio::test]
async fn admin_changes_are_persisted_through_the_api() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(state(&dir, false).await);

    let response = app
        .oneshot(post_json(
            "/commands",
            &json!({ "user_id": "U1", "channel_id": "C1", "text": "!admin-add <@U2>" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let persisted = std::fs::read_to_string(dir.path().join(".env")).unwrap();
    assert!(persisted.starts_with("# roster\n"));
    assert!(persisted.contains("ADMIN_USER_IDS=U1,U2"));
}

#[tokio::test]
async fn blank_ids_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(state(&dir, false).await);

    let response = app
        .oneshot(post_json(
            "/commands",
            &json!({ "user_id": " ", "channel_id": "C1", "text": "!help" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn slack_events_need_a_token() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(state(&dir, false).await);

    let response = app
        .oneshot(post_json(
            "/slack/events",
            &json!({ "type": "url_verification", "challenge": "abc" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn slack_url_verification_echoes_challenge() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(state(&dir, true).await);

    let response = app
        .oneshot(post_json(
            "/slack/events",
            &json!({ "token": "t", "type": "url_verification", "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["challenge"],
        "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
    );
}

#[tokio::test]
async fn slack_bot_messages_are_acknowledged_and_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir, true).await;
    let audit = state.bot.audit().clone();
    let app = router(state);

    let response = app
        .oneshot(post_json(
            "/slack/events",
            &json!({
                "type": "event_callback",
                "event": {
                    "type": "message",
                    "bot_id": "B1",
                    "user": "U2",
                    "channel": "C1",
                    "text": "!audit-logs"
                }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(audit.is_empty().await);
}
