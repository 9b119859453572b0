use axum::Json;
use axum::extract::State;
use serde::Serialize;
use spyglass_bot::{CollectingResponder, IncomingMessage};

use super::AppState;
use crate::error::ServerError;

/// Replies produced for one inbound message; empty when the text was not a
/// command.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub replies: Vec<String>,
}

/// `POST /commands`: run a message through the dispatcher and return the
/// replies in the response body.
pub async fn run_command(
    State(state): State<AppState>,
    Json(message): Json<IncomingMessage>,
) -> Result<Json<CommandResponse>, ServerError> {
    if message.user_id.trim().is_empty() || message.channel_id.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "user_id and channel_id must not be empty".into(),
        ));
    }
    let responder = CollectingResponder::new();
    state
        .bot
        .handle(&message, &responder)
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;
    Ok(Json(CommandResponse {
        replies: responder.into_replies(),
    }))
}
