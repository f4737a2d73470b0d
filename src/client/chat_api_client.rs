use futures::stream::StreamExt;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::UserId;
use crate::presentation::extractors::USER_ID_HEADER;
use crate::presentation::handlers::ErrorResponse;
use crate::presentation::handlers::dto::{
    ConversationDetailResponse, ConversationResponse, CreateConversationRequest,
    GenerateImageRequest, GenerateImageResponse, SendMessageRequest,
};

use super::{StreamConsumer, StreamUpdate};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Completed,
    Failed(String),
    Cancelled,
}

/// Result of sending a message: how the stream ended, plus the conversation
/// as persisted afterwards (`None` if it no longer exists).
#[derive(Debug)]
pub struct SendOutcome {
    pub status: StreamStatus,
    pub conversation: Option<ConversationDetailResponse>,
}

/// HTTP client for the chat API, acting as one authenticated user.
#[derive(Debug, Clone)]
pub struct ChatApiClient {
    http: Client,
    base_url: String,
    user_id: UserId,
}

impl ChatApiClient {
    pub fn new(base_url: impl Into<String>, user_id: UserId) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(USER_ID_HEADER, self.user_id.as_str())
    }

    pub async fn list_conversations(&self) -> Result<Vec<ConversationResponse>, ClientError> {
        let response = self
            .request(Method::GET, "/api/conversations")
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn get_conversation(
        &self,
        id: Uuid,
    ) -> Result<Option<ConversationDetailResponse>, ClientError> {
        let response = self
            .request(Method::GET, &format!("/api/conversations/{}", id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(ensure_success(response).await?.json().await?))
    }

    pub async fn create_conversation(
        &self,
        title: Option<&str>,
    ) -> Result<ConversationResponse, ClientError> {
        let response = self
            .request(Method::POST, "/api/conversations")
            .json(&CreateConversationRequest {
                title: title.map(String::from),
            })
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn delete_conversation(&self, id: Uuid) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/api/conversations/{}", id))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    pub async fn generate_image(
        &self,
        prompt: &str,
        source_image: Option<&str>,
    ) -> Result<GenerateImageResponse, ClientError> {
        let response = self
            .request(Method::POST, "/api/generate-image")
            .json(&GenerateImageRequest {
                prompt: Some(prompt.to_string()),
                source_image: source_image.map(String::from),
            })
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    /// Sends `content` and feeds each update, with the transcript so far, to
    /// `on_update`. However the stream ends (done, error or `cancel`), the
    /// local transcript is discarded and the conversation is fetched again so
    /// the caller sees only what the server persisted.
    pub async fn send_message<F>(
        &self,
        conversation_id: Uuid,
        content: &str,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> Result<SendOutcome, ClientError>
    where
        F: FnMut(&StreamUpdate, &str),
    {
        let status = match self
            .consume_stream(conversation_id, content, cancel, &mut on_update)
            .await
        {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(error = %e, conversation_id = %conversation_id, "Message stream failed");
                StreamStatus::Failed(e.to_string())
            }
        };

        let conversation = self.get_conversation(conversation_id).await?;
        Ok(SendOutcome {
            status,
            conversation,
        })
    }

    async fn consume_stream<F>(
        &self,
        conversation_id: Uuid,
        content: &str,
        cancel: &CancellationToken,
        on_update: &mut F,
    ) -> Result<StreamStatus, ClientError>
    where
        F: FnMut(&StreamUpdate, &str),
    {
        let send = self
            .request(
                Method::POST,
                &format!("/api/conversations/{}/messages", conversation_id),
            )
            .json(&SendMessageRequest {
                content: Some(content.to_string()),
            })
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StreamStatus::Cancelled),
            response = send => response?,
        };
        let response = ensure_success(response).await?;

        let mut consumer = StreamConsumer::new();
        let mut body = response.bytes_stream();
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(StreamStatus::Cancelled),
                chunk = body.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    for update in consumer.push(&bytes) {
                        on_update(&update, consumer.transcript());
                    }
                }
                Some(Err(e)) => return Err(ClientError::Transport(e)),
                None => break,
            }
        }
        for update in consumer.finish() {
            on_update(&update, consumer.transcript());
        }

        Ok(match consumer.error() {
            Some(error) => StreamStatus::Failed(error.to_string()),
            None if consumer.is_done() => StreamStatus::Completed,
            None => StreamStatus::Failed("stream ended before completion".to_string()),
        })
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    Err(ClientError::Status { status, message })
}
