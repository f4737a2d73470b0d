mod conversations;
pub mod dto;
mod error_response;
mod health;
mod images;
mod messages;

pub use conversations::{
    create_conversation_handler, delete_conversation_handler, get_conversation_handler,
    list_conversations_handler,
};
pub use error_response::ErrorResponse;
pub use health::health_handler;
pub use images::generate_image_handler;
pub use messages::send_message_handler;
