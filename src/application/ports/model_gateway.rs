use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::domain::{InlineImage, Message};

pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, GatewayError>> + Send + 'static>>;

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub source_image: Option<InlineImage>,
}

impl ImageRequest {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            source_image: None,
        }
    }
}

/// Boundary around the remote generative-model provider.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Opens a streaming text completion over `history` under `system_instruction`.
    /// Dropping the returned stream abandons the upstream request.
    async fn stream_chat(
        &self,
        system_instruction: &str,
        history: &[Message],
    ) -> Result<TokenStream, GatewayError>;

    async fn generate_image(&self, request: &ImageRequest) -> Result<InlineImage, GatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("no image data in response")]
    NoImageData,
    #[error("timed out after {0}s")]
    Timeout(u64),
    #[error("configuration error: {0}")]
    Configuration(String),
}
