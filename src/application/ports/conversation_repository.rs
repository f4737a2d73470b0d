use crate::domain::{Conversation, ConversationId, Message, UserId};
use async_trait::async_trait;

use super::RepositoryError;

/// Persistence for conversations and their messages. Every read and write is
/// scoped to the owning user; a conversation owned by someone else behaves as
/// if it did not exist.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn list_conversations(&self, user_id: &UserId)
    -> Result<Vec<Conversation>, RepositoryError>;

    /// Returns the conversation with its messages ordered oldest first.
    async fn get_conversation(
        &self,
        id: ConversationId,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError>;

    async fn create_conversation(&self, conversation: &Conversation)
    -> Result<(), RepositoryError>;

    /// Deletes the conversation and all of its messages. Returns `false` when
    /// nothing owned by `user_id` matched.
    async fn delete_conversation(
        &self,
        id: ConversationId,
        user_id: &UserId,
    ) -> Result<bool, RepositoryError>;

    /// Fails with `RepositoryError::NotFound` unless the message's conversation
    /// is owned by `user_id`.
    async fn append_message(&self, message: &Message, user_id: &UserId)
    -> Result<(), RepositoryError>;

    /// Returns at most `limit` of the most recent messages, oldest first.
    /// Empty when the conversation is not owned by `user_id`.
    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError>;
}
