//! HTTP surface: a generic command endpoint and the Slack Events endpoint.

pub mod commands;
pub mod health;
pub mod slack;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use spyglass_bot::Bot;
use spyglass_slack::SlackClient;
use tower_http::trace::TraceLayer;

/// Shared application state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<Bot>,
    /// `None` when no Slack token is configured; `/slack/events` then
    /// answers 503.
    pub slack: Option<Arc<SlackClient>>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/commands", post(commands::run_command))
        .route("/slack/events", post(slack::events))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
