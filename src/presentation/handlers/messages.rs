use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::StreamExt;

use crate::application::ports::ModelGateway;
use crate::application::services::ChatError;
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::extractors::AuthenticatedUser;
use crate::presentation::state::AppState;

use super::conversations::parse_conversation_id;
use super::dto::SendMessageRequest;
use super::error_response::{error_response, invalid_body};

/// Persists the user's message and streams the assistant's reply as SSE.
/// Failures before the stream opens are plain JSON errors; later failures
/// arrive as an `{"error": ...}` event.
#[tracing::instrument(skip(state, payload), fields(user_id = %user_id))]
pub async fn send_message_handler<G>(
    State(state): State<AppState<G>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<String>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Response
where
    G: ModelGateway + 'static,
{
    let conversation_id = match parse_conversation_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_body(rejection),
    };

    let Some(content) = request.content.filter(|c| !c.trim().is_empty()) else {
        tracing::warn!("Message without content");
        return error_response(StatusCode::BAD_REQUEST, "Message content is required");
    };

    tracing::debug!(content = %sanitize_prompt(&content), "Processing message");

    let turn = match state
        .chat_service
        .start_turn(conversation_id, &user_id, content)
        .await
    {
        Ok(turn) => turn,
        Err(ChatError::ConversationNotFound(_)) => {
            return error_response(StatusCode::NOT_FOUND, "Conversation not found");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to start chat turn");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to send message");
        }
    };

    let keep_alive_seconds = state.settings.llm.sse_keep_alive_seconds;
    let events = state.chat_service.relay(turn).map(|event| {
        let payload = serde_json::to_string(&event).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(payload))
    });

    Sse::new(events)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(keep_alive_seconds))
                .text("keep-alive"),
        )
        .into_response()
}
