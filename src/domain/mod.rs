mod conversation;
mod conversation_id;
mod image_directive;
mod inline_image;
mod message;
mod message_id;
mod message_role;
mod user_id;

pub use conversation::Conversation;
pub use conversation_id::ConversationId;
pub use image_directive::extract_image_prompt;
pub use inline_image::{InlineImage, InlineImageError};
pub use message::Message;
pub use message_id::MessageId;
pub use message_role::MessageRole;
pub use user_id::UserId;
