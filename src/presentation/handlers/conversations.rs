use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::ports::ModelGateway;
use crate::domain::{Conversation, ConversationId};
use crate::presentation::extractors::AuthenticatedUser;
use crate::presentation::state::AppState;

use super::dto::{ConversationDetailResponse, ConversationResponse, CreateConversationRequest};
use super::error_response::error_response;

pub(super) fn parse_conversation_id(raw: &str) -> Result<ConversationId, Response> {
    raw.parse::<ConversationId>().map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid conversation ID: {}", raw),
        )
    })
}

#[tracing::instrument(skip(state), fields(user_id = %user_id))]
pub async fn list_conversations_handler<G>(
    State(state): State<AppState<G>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Response
where
    G: ModelGateway + 'static,
{
    match state
        .conversation_repository
        .list_conversations(&user_id)
        .await
    {
        Ok(conversations) => {
            let body: Vec<ConversationResponse> =
                conversations.iter().map(ConversationResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch conversations");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch conversations",
            )
        }
    }
}

#[tracing::instrument(skip(state), fields(user_id = %user_id))]
pub async fn get_conversation_handler<G>(
    State(state): State<AppState<G>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<String>,
) -> Response
where
    G: ModelGateway + 'static,
{
    let conversation_id = match parse_conversation_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state
        .conversation_repository
        .get_conversation(conversation_id, &user_id)
        .await
    {
        Ok(Some(conversation)) => (
            StatusCode::OK,
            Json(ConversationDetailResponse::from(&conversation)),
        )
            .into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Conversation not found"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch conversation");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch conversation",
            )
        }
    }
}

/// The body is optional; an absent or blank title falls back to the configured default.
#[tracing::instrument(skip(state, body), fields(user_id = %user_id))]
pub async fn create_conversation_handler<G>(
    State(state): State<AppState<G>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    body: Bytes,
) -> Response
where
    G: ModelGateway + 'static,
{
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateConversationRequest::default()
    } else {
        match serde_json::from_slice::<CreateConversationRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid request body: {}", e),
                );
            }
        }
    };

    let title = request
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| state.settings.chat.default_conversation_title.clone());

    let conversation = Conversation::new(user_id, title);
    match state
        .conversation_repository
        .create_conversation(&conversation)
        .await
    {
        Ok(()) => {
            tracing::info!(conversation_id = %conversation.id, "Conversation created");
            (
                StatusCode::CREATED,
                Json(ConversationResponse::from(&conversation)),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create conversation");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create conversation",
            )
        }
    }
}

#[tracing::instrument(skip(state), fields(user_id = %user_id))]
pub async fn delete_conversation_handler<G>(
    State(state): State<AppState<G>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<String>,
) -> Response
where
    G: ModelGateway + 'static,
{
    let conversation_id = match parse_conversation_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state
        .conversation_repository
        .delete_conversation(conversation_id, &user_id)
        .await
    {
        Ok(true) => {
            tracing::info!(conversation_id = %conversation_id, "Conversation deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Conversation not found"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete conversation");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete conversation",
            )
        }
    }
}
