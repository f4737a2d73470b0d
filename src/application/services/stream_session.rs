use crate::domain::{ConversationId, InlineImage, Message, MessageRole, UserId};

/// Accumulator for one streamed assistant reply. Lives only as long as the
/// request that created it and is never shared with another task.
#[derive(Debug)]
pub struct StreamSession {
    conversation_id: ConversationId,
    user_id: UserId,
    accumulated: String,
}

impl StreamSession {
    pub fn new(conversation_id: ConversationId, user_id: UserId) -> Self {
        Self {
            conversation_id,
            user_id,
            accumulated: String::new(),
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    pub fn push_fragment(&mut self, fragment: &str) {
        self.accumulated.push_str(fragment);
    }

    pub fn append_image(&mut self, image: &InlineImage) {
        self.accumulated.push_str(&image.to_markdown());
    }

    pub fn into_assistant_message(self) -> Message {
        Message::new(self.conversation_id, MessageRole::Assistant, self.accumulated)
    }
}
