use super::{ConversationId, Message, UserId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: UserId,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(user_id: UserId, title: String) -> Self {
        Self {
            id: ConversationId::new(),
            user_id,
            title,
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }
}
