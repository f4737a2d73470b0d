mod gemini_gateway;
mod mock_model_gateway;

pub use gemini_gateway::GeminiGateway;
pub use mock_model_gateway::MockModelGateway;
