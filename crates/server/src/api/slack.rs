use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use spyglass_slack::{EventEnvelope, SlackResponder};
use tracing::{debug, error};

use super::AppState;

/// `POST /slack/events`: Events API callback.
///
/// Commands run in the background so the acknowledgement goes out within
/// Slack's three second window; the reply is posted separately.
pub async fn events(State(state): State<AppState>, Json(envelope): Json<EventEnvelope>) -> Response {
    let Some(slack) = state.slack.clone() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Slack is not configured" })),
        )
            .into_response();
    };

    match envelope {
        EventEnvelope::UrlVerification { challenge } => {
            Json(json!({ "challenge": challenge })).into_response()
        }
        EventEnvelope::EventCallback { event } => {
            let thread_ts = event.thread_ts.clone();
            let Some(message) = event.into_incoming() else {
                debug!("ignoring non-user message event");
                return StatusCode::OK.into_response();
            };
            let responder =
                SlackResponder::new(slack, message.channel_id.clone()).in_thread(thread_ts);
            let bot = state.bot.clone();
            tokio::spawn(async move {
                if let Err(e) = bot.handle(&message, &responder).await {
                    error!(
                        user = %message.user_id,
                        channel = %message.channel_id,
                        error = %e,
                        "failed to deliver reply"
                    );
                }
            });
            StatusCode::OK.into_response()
        }
        EventEnvelope::Unsupported => StatusCode::OK.into_response(),
    }
}
