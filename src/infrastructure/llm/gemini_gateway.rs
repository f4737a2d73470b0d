use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{GatewayError, ImageRequest, ModelGateway, TokenStream};
use crate::domain::{InlineImage, Message, MessageRole};
use crate::infrastructure::sse::SseEventDecoder;
use crate::presentation::config::LlmSettings;

const API_KEY_HEADER: &str = "x-goog-api-key";

// Every harm filter is switched off for the persona.
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];
const BLOCK_NONE: &str = "BLOCK_NONE";

pub struct GeminiGateway {
    client: Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    image_model: String,
    request_timeout: Duration,
    enable_search_grounding: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    safety_settings: Vec<SafetySetting>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    data: String,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }

    fn image(image: &InlineImage) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: Some(image.mime_type.clone()),
                data: image.to_base64(),
            }),
        }
    }
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    fn text(&self) -> String {
        self.first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect()
    }

    fn inline_data(&self) -> Option<&InlineData> {
        self.first_parts().iter().find_map(|p| p.inline_data.as_ref())
    }
}

fn safety_settings() -> Vec<SafetySetting> {
    HARM_CATEGORIES
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: BLOCK_NONE,
        })
        .collect()
}

fn upstream_role(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "model",
    }
}

fn parse_stream_event(data: &str) -> Option<Result<String, GatewayError>> {
    match serde_json::from_str::<GenerateContentResponse>(data) {
        Ok(chunk) => {
            let text = chunk.text();
            (!text.is_empty()).then_some(Ok(text))
        }
        Err(e) => Some(Err(GatewayError::InvalidResponse(e.to_string()))),
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GatewayError::RateLimited);
    }

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::ApiRequestFailed(format!(
            "HTTP {}: {}",
            status, body
        )));
    }

    Ok(response)
}

impl GeminiGateway {
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, GatewayError> {
        let base_url = settings.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(GatewayError::Configuration(
                "llm.base_url must not be empty".to_string(),
            ));
        }

        let request_timeout = Duration::from_secs(settings.request_timeout_seconds);
        let client = Client::builder()
            .connect_timeout(request_timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: settings.api_key.clone(),
            chat_model: settings.chat_model.clone(),
            image_model: settings.image_model.clone(),
            request_timeout,
            enable_search_grounding: settings.enable_search_grounding,
        })
    }

    fn build_chat_request(
        &self,
        system_instruction: &str,
        history: &[Message],
    ) -> GenerateContentRequest {
        let contents = history
            .iter()
            .map(|m| Content {
                role: Some(upstream_role(m.role).to_string()),
                parts: vec![Part::text(&m.content)],
            })
            .collect();

        let tools = if self.enable_search_grounding {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(system_instruction)],
            }),
            contents,
            safety_settings: safety_settings(),
            tools,
            generation_config: None,
        }
    }

    fn build_image_request(&self, request: &ImageRequest) -> GenerateContentRequest {
        let mut parts = vec![Part::text(&request.prompt)];
        if let Some(source) = &request.source_image {
            parts.push(Part::image(source));
        }

        GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            safety_settings: safety_settings(),
            tools: Vec::new(),
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["TEXT", "IMAGE"],
            }),
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.request_timeout.as_secs())
        } else {
            GatewayError::ApiRequestFailed(e.to_string())
        }
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    #[tracing::instrument(skip(self, system_instruction, history), fields(model = %self.chat_model, turns = history.len()))]
    async fn stream_chat(
        &self,
        system_instruction: &str,
        history: &[Message],
    ) -> Result<TokenStream, GatewayError> {
        let request_body = self.build_chat_request(system_instruction, history);
        let request = self
            .client
            .post(format!(
                "{}/models/{}:streamGenerateContent?alt=sse",
                self.base_url, self.chat_model
            ))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body);

        // Only the response head is bounded; the body may stream for as long as it keeps producing.
        let response = tokio::time::timeout(self.request_timeout, request.send())
            .await
            .map_err(|_| GatewayError::Timeout(self.request_timeout.as_secs()))?
            .map_err(|e| self.map_send_error(e))?;
        let response = ensure_success(response).await?;

        // `None` marks the end of the body and flushes a trailing unterminated event.
        let chunks = response
            .bytes_stream()
            .map(Some)
            .chain(futures::stream::once(async { None }));

        let mut decoder = SseEventDecoder::new();
        let token_stream = Box::pin(chunks.flat_map(move |chunk| {
            let items: Vec<Result<String, GatewayError>> = match chunk {
                Some(Ok(bytes)) => decoder
                    .push(&bytes)
                    .iter()
                    .filter_map(|data| parse_stream_event(data))
                    .collect(),
                Some(Err(e)) => vec![Err(GatewayError::ApiRequestFailed(e.to_string()))],
                None => decoder
                    .finish()
                    .and_then(|data| parse_stream_event(&data))
                    .into_iter()
                    .collect(),
            };
            futures::stream::iter(items)
        }));

        Ok(token_stream)
    }

    #[tracing::instrument(skip(self, request), fields(model = %self.image_model, has_source = request.source_image.is_some()))]
    async fn generate_image(&self, request: &ImageRequest) -> Result<InlineImage, GatewayError> {
        let request_body = self.build_image_request(request);
        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.image_model
            ))
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.request_timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = ensure_success(response).await?;

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let inline_data = generated.inline_data().ok_or(GatewayError::NoImageData)?;
        if inline_data.data.is_empty() {
            return Err(GatewayError::NoImageData);
        }

        InlineImage::from_base64(inline_data.mime_type.as_deref(), &inline_data.data)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}
