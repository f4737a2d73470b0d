use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Conversation, InlineImage, Message};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A conversation together with its messages, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDetailResponse {
    #[serde(flatten)]
    pub conversation: ConversationResponse,
    pub messages: Vec<MessageResponse>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub source_image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateImageResponse {
    pub b64_json: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl From<&Conversation> for ConversationResponse {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.as_uuid(),
            user_id: conversation.user_id.to_string(),
            title: conversation.title.clone(),
            created_at: conversation.created_at,
        }
    }
}

impl From<&Message> for MessageResponse {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.as_uuid(),
            conversation_id: message.conversation_id.as_uuid(),
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

impl From<&Conversation> for ConversationDetailResponse {
    fn from(conversation: &Conversation) -> Self {
        Self {
            conversation: conversation.into(),
            messages: conversation.messages.iter().map(Into::into).collect(),
        }
    }
}

impl From<&InlineImage> for GenerateImageResponse {
    fn from(image: &InlineImage) -> Self {
        Self {
            b64_json: image.to_base64(),
            mime_type: image.mime_type.clone(),
        }
    }
}
