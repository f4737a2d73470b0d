use std::sync::Arc;
use std::time::Duration;

use futures::stream::{Stream, StreamExt};
use serde::Serialize;

use crate::application::ports::{
    ConversationRepository, GatewayError, ImageRequest, ModelGateway, RepositoryError,
    TokenStream,
};
use crate::domain::{ConversationId, Message, MessageRole, UserId, extract_image_prompt};

use super::StreamSession;

const SEND_FAILED_MESSAGE: &str = "Failed to send message";

/// One event on the browser-facing stream. Serializes to the bare JSON
/// payload carried by an SSE `data:` line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelayEvent {
    Content {
        content: String,
    },
    Image {
        #[serde(rename = "imageUrl")]
        image_url: String,
    },
    Done {
        done: bool,
    },
    Error {
        error: String,
    },
}

/// A turn whose user message is persisted and whose upstream stream is open.
pub struct ChatTurn {
    session: StreamSession,
    token_stream: TokenStream,
}

impl ChatTurn {
    pub fn conversation_id(&self) -> ConversationId {
        self.session.conversation_id()
    }
}

pub struct ChatService<G>
where
    G: ModelGateway,
{
    gateway: Arc<G>,
    repository: Arc<dyn ConversationRepository>,
    system_instruction: String,
    history_limit: usize,
    stream_idle_timeout: Duration,
}

impl<G> ChatService<G>
where
    G: ModelGateway + 'static,
{
    pub fn new(
        gateway: Arc<G>,
        repository: Arc<dyn ConversationRepository>,
        system_instruction: String,
        history_limit: usize,
        stream_idle_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            repository,
            system_instruction,
            history_limit,
            stream_idle_timeout,
        }
    }

    /// Persists the user's message, loads history and opens the upstream
    /// stream. Nothing has been sent to the client yet when this fails.
    #[tracing::instrument(skip(self, content), fields(conversation_id = %conversation_id, user_id = %user_id))]
    pub async fn start_turn(
        &self,
        conversation_id: ConversationId,
        user_id: &UserId,
        content: String,
    ) -> Result<ChatTurn, ChatError> {
        let user_message = Message::new(conversation_id, MessageRole::User, content);
        self.repository
            .append_message(&user_message, user_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => ChatError::ConversationNotFound(conversation_id),
                other => ChatError::Repository(other),
            })?;

        let history = self
            .repository
            .get_messages(conversation_id, user_id, self.history_limit)
            .await?;
        tracing::debug!(history_len = history.len(), "Opening upstream stream");

        let token_stream = self
            .gateway
            .stream_chat(&self.system_instruction, &history)
            .await?;

        Ok(ChatTurn {
            session: StreamSession::new(conversation_id, user_id.clone()),
            token_stream,
        })
    }

    /// Drives a started turn to completion: forwards every fragment as it
    /// arrives, honours the first image directive, persists the assistant
    /// message and finishes with `Done`. Dropping the stream before it ends
    /// discards the partial reply without persisting anything.
    pub fn relay(&self, turn: ChatTurn) -> impl Stream<Item = RelayEvent> + Send + 'static {
        let gateway = Arc::clone(&self.gateway);
        let repository = Arc::clone(&self.repository);
        let idle_timeout = self.stream_idle_timeout;
        let ChatTurn {
            mut session,
            mut token_stream,
        } = turn;

        async_stream::stream! {
            loop {
                match tokio::time::timeout(idle_timeout, token_stream.next()).await {
                    Ok(Some(Ok(fragment))) => {
                        if fragment.is_empty() {
                            continue;
                        }
                        session.push_fragment(&fragment);
                        yield RelayEvent::Content { content: fragment };
                    }
                    Ok(Some(Err(e))) => {
                        tracing::error!(error = %e, conversation_id = %session.conversation_id(), "Upstream stream failed");
                        yield RelayEvent::Error { error: SEND_FAILED_MESSAGE.to_string() };
                        return;
                    }
                    Ok(None) => break,
                    Err(_) => {
                        let e = GatewayError::Timeout(idle_timeout.as_secs());
                        tracing::error!(error = %e, conversation_id = %session.conversation_id(), "Upstream stream stalled");
                        yield RelayEvent::Error { error: SEND_FAILED_MESSAGE.to_string() };
                        return;
                    }
                }
            }
            drop(token_stream);

            if let Some(prompt) = extract_image_prompt(session.accumulated()) {
                tracing::info!(prompt_chars = prompt.len(), "Image directive found in response");
                match gateway.generate_image(&ImageRequest::from_prompt(prompt)).await {
                    Ok(image) => {
                        session.append_image(&image);
                        yield RelayEvent::Image { image_url: image.to_data_uri() };
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Image generation failed, keeping text-only response");
                    }
                }
            }

            let user_id = session.user_id().clone();
            let assistant_message = session.into_assistant_message();
            if let Err(e) = repository.append_message(&assistant_message, &user_id).await {
                tracing::error!(error = %e, "Failed to persist assistant message");
                yield RelayEvent::Error { error: SEND_FAILED_MESSAGE.to_string() };
                return;
            }

            tracing::info!(
                conversation_id = %assistant_message.conversation_id,
                response_chars = assistant_message.content.len(),
                "Assistant message persisted"
            );
            yield RelayEvent::Done { done: true };
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),
}
