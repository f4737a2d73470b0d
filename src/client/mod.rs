mod chat_api_client;
mod stream_consumer;

pub use chat_api_client::{ChatApiClient, ClientError, SendOutcome, StreamStatus};
pub use stream_consumer::{StreamConsumer, StreamPayload, StreamUpdate};
