use std::sync::Arc;

use crate::application::ports::{ConversationRepository, ModelGateway};
use crate::application::services::ChatService;
use crate::presentation::config::Settings;

pub struct AppState<G>
where
    G: ModelGateway,
{
    pub chat_service: Arc<ChatService<G>>,
    pub model_gateway: Arc<G>,
    pub conversation_repository: Arc<dyn ConversationRepository>,
    pub settings: Settings,
}

impl<G> Clone for AppState<G>
where
    G: ModelGateway,
{
    fn clone(&self) -> Self {
        Self {
            chat_service: Arc::clone(&self.chat_service),
            model_gateway: Arc::clone(&self.model_gateway),
            conversation_repository: Arc::clone(&self.conversation_repository),
            settings: self.settings.clone(),
        }
    }
}
