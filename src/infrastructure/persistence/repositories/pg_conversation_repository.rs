use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{ConversationRepository, RepositoryError};
use crate::domain::{Conversation, ConversationId, Message, MessageId, MessageRole, UserId};

pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ConversationRow {
    id: Uuid,
    user_id: String,
    title: String,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    role: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl ConversationRow {
    fn into_conversation(self, messages: Vec<Message>) -> Conversation {
        Conversation {
            id: ConversationId::from_uuid(self.id),
            user_id: UserId::new(self.user_id),
            title: self.title,
            messages,
            created_at: self.created_at,
        }
    }
}

impl TryFrom<MessageRow> for Message {
    type Error = RepositoryError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<MessageRole>()
            .map_err(RepositoryError::QueryFailed)?;

        Ok(Message {
            id: MessageId::from_uuid(row.id),
            conversation_id: ConversationId::from_uuid(row.conversation_id),
            role,
            content: row.content,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn list_conversations(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query_as::<_, ConversationRow>(
            r#"
            SELECT id, user_id, title, created_at
            FROM conversations
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| r.into_conversation(Vec::new()))
            .collect())
    }

    #[instrument(skip(self), fields(conversation_id = %id, user_id = %user_id))]
    async fn get_conversation(
        &self,
        id: ConversationId,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            SELECT id, user_id, title, created_at
            FROM conversations
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        match row {
            Some(r) => {
                let rows = sqlx::query_as::<_, MessageRow>(
                    r#"
                    SELECT id, conversation_id, role, content, created_at
                    FROM messages
                    WHERE conversation_id = $1
                    ORDER BY created_at ASC
                    "#,
                )
                .bind(id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

                let messages = rows
                    .into_iter()
                    .map(Message::try_from)
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Some(r.into_conversation(messages)))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id, user_id = %conversation.user_id))]
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, user_id, title, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(conversation.id.as_uuid())
        .bind(conversation.user_id.as_str())
        .bind(&conversation.title)
        .bind(conversation.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %id, user_id = %user_id))]
    async fn delete_conversation(
        &self,
        id: ConversationId,
        user_id: &UserId,
    ) -> Result<bool, RepositoryError> {
        // messages.conversation_id cascades on delete
        let result = sqlx::query(
            r#"
            DELETE FROM conversations
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, message), fields(message_id = %message.id, conversation_id = %message.conversation_id, role = %message.role))]
    async fn append_message(
        &self,
        message: &Message,
        user_id: &UserId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, created_at)
            SELECT $1, c.id, $3, $4, $5
            FROM conversations c
            WHERE c.id = $2 AND c.user_id = $6
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.conversation_id.as_uuid())
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at)
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "conversation {}",
                message.conversation_id
            )));
        }

        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id, user_id = %user_id, limit = %limit))]
    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT m.id, m.conversation_id, m.role, m.content, m.created_at
            FROM messages m
            JOIN conversations c ON c.id = m.conversation_id AND c.user_id = $2
            WHERE m.conversation_id = $1
            ORDER BY m.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(user_id.as_str())
        .bind(limit_i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let mut messages = rows
            .into_iter()
            .map(Message::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        messages.reverse();
        Ok(messages)
    }
}
