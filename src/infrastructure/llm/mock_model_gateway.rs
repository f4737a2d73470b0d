use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::application::ports::{GatewayError, ImageRequest, ModelGateway, TokenStream};
use crate::domain::{InlineImage, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEnding {
    Complete,
    Fail,
    Stall,
}

/// Scriptable gateway for tests and local runs without provider credentials.
#[derive(Clone)]
pub struct MockModelGateway {
    fragments: Vec<String>,
    ending: StreamEnding,
    fail_on_open: bool,
    image: Option<InlineImage>,
    histories: Arc<Mutex<Vec<Vec<Message>>>>,
    image_requests: Arc<Mutex<Vec<ImageRequest>>>,
}

impl MockModelGateway {
    pub fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            ending: StreamEnding::Complete,
            fail_on_open: false,
            image: None,
            histories: Arc::new(Mutex::new(Vec::new())),
            image_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `stream_chat` fails before any fragment is produced.
    pub fn failing_on_open(mut self) -> Self {
        self.fail_on_open = true;
        self
    }

    /// The stream yields an error after the scripted fragments.
    pub fn failing_mid_stream(mut self) -> Self {
        self.ending = StreamEnding::Fail;
        self
    }

    /// The stream never ends after the scripted fragments.
    pub fn stalling_mid_stream(mut self) -> Self {
        self.ending = StreamEnding::Stall;
        self
    }

    /// Image requests succeed with `image`; without it they fail with `NoImageData`.
    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }

    /// Histories received by `stream_chat`, in call order.
    pub fn histories(&self) -> Vec<Vec<Message>> {
        self.histories
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn image_prompts(&self) -> Vec<String> {
        self.image_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }
}

impl Default for MockModelGateway {
    fn default() -> Self {
        Self::with_fragments(["Mock answer"])
    }
}

#[async_trait]
impl ModelGateway for MockModelGateway {
    async fn stream_chat(
        &self,
        _system_instruction: &str,
        history: &[Message],
    ) -> Result<TokenStream, GatewayError> {
        self.histories
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(history.to_vec());

        if self.fail_on_open {
            return Err(GatewayError::ApiRequestFailed("mock open failure".to_string()));
        }

        let fragments = stream::iter(self.fragments.clone().into_iter().map(Ok));
        let token_stream: TokenStream = match self.ending {
            StreamEnding::Complete => Box::pin(fragments),
            StreamEnding::Fail => Box::pin(fragments.chain(stream::once(async {
                Err(GatewayError::ApiRequestFailed("mock stream failure".to_string()))
            }))),
            StreamEnding::Stall => Box::pin(fragments.chain(stream::pending())),
        };

        Ok(token_stream)
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<InlineImage, GatewayError> {
        self.image_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        self.image.clone().ok_or(GatewayError::NoImageData)
    }
}
