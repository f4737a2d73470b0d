mod chat_service;
mod stream_session;

pub use chat_service::{ChatError, ChatService, ChatTurn, RelayEvent};
pub use stream_session::StreamSession;
