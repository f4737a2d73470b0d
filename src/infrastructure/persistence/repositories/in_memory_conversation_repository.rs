use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::application::ports::{ConversationRepository, RepositoryError};
use crate::domain::{Conversation, ConversationId, Message, UserId};

/// Process-local conversation store for tests and local development.
#[derive(Clone, Default)]
pub struct InMemoryConversationRepository {
    conversations: Arc<Mutex<HashMap<ConversationId, Conversation>>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<ConversationId, Conversation>>, RepositoryError> {
        self.conversations
            .lock()
            .map_err(|e| RepositoryError::ConnectionFailed(format!("store lock poisoned: {}", e)))
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn list_conversations(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let store = self.lock()?;
        let mut result: Vec<Conversation> = store
            .values()
            .filter(|c| c.is_owned_by(user_id))
            .map(|c| Conversation {
                messages: Vec::new(),
                ..c.clone()
            })
            .collect();

        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn get_conversation(
        &self,
        id: ConversationId,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let store = self.lock()?;
        Ok(store.get(&id).filter(|c| c.is_owned_by(user_id)).cloned())
    }

    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        if store.contains_key(&conversation.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "conversation {} already exists",
                conversation.id
            )));
        }
        store.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn delete_conversation(
        &self,
        id: ConversationId,
        user_id: &UserId,
    ) -> Result<bool, RepositoryError> {
        let mut store = self.lock()?;
        match store.get(&id) {
            Some(c) if c.is_owned_by(user_id) => {
                store.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_message(
        &self,
        message: &Message,
        user_id: &UserId,
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        let conversation = store
            .get_mut(&message.conversation_id)
            .filter(|c| c.is_owned_by(user_id))
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("conversation {}", message.conversation_id))
            })?;

        conversation.messages.push(message.clone());
        Ok(())
    }

    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let store = self.lock()?;
        let messages = store
            .get(&conversation_id)
            .filter(|c| c.is_owned_by(user_id))
            .map(|c| {
                let skip = c.messages.len().saturating_sub(limit);
                c.messages[skip..].to_vec()
            })
            .unwrap_or_default();
        Ok(messages)
    }
}
