use serde::Deserialize;

use crate::infrastructure::sse::SseEventDecoder;

/// Any subset of the fields the relay may put in one event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPayload {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    Content(String),
    Image(String),
    Done,
    Error(String),
}

/// Turns the raw bytes of a reply stream into updates and keeps the running,
/// display-only transcript. The transcript is never persisted; callers drop
/// it once the stream ends and re-read the conversation instead.
#[derive(Debug, Default)]
pub struct StreamConsumer {
    decoder: SseEventDecoder,
    transcript: String,
    done: bool,
    error: Option<String>,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamUpdate> {
        let payloads = self.decoder.push(chunk);
        let mut updates = Vec::new();
        for data in payloads {
            self.apply(&data, &mut updates);
        }
        updates
    }

    /// Processes an unterminated trailing event, if any.
    pub fn finish(&mut self) -> Vec<StreamUpdate> {
        let mut updates = Vec::new();
        if let Some(data) = self.decoder.finish() {
            self.apply(&data, &mut updates);
        }
        updates
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn apply(&mut self, data: &str, updates: &mut Vec<StreamUpdate>) {
        let payload = match serde_json::from_str::<StreamPayload>(data) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unparseable stream event");
                return;
            }
        };

        if let Some(content) = payload.content.filter(|c| !c.is_empty()) {
            self.transcript.push_str(&content);
            updates.push(StreamUpdate::Content(content));
        }
        if let Some(image_url) = payload.image_url.filter(|u| !u.is_empty()) {
            self.transcript
                .push_str(&format!("\n\n![Generated Image]({})", image_url));
            updates.push(StreamUpdate::Image(image_url));
        }
        if payload.done == Some(true) {
            self.done = true;
            updates.push(StreamUpdate::Done);
        }
        if let Some(error) = payload.error {
            self.error = Some(error.clone());
            updates.push(StreamUpdate::Error(error));
        }
    }
}
