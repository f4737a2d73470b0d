mod conversation_repository;
mod model_gateway;
mod repository_error;

pub use conversation_repository::ConversationRepository;
pub use model_gateway::{GatewayError, ImageRequest, ModelGateway, TokenStream};
pub use repository_error::RepositoryError;
