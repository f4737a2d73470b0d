mod environment;
mod settings;

pub use environment::{ENVIRONMENT_VARIABLE, Environment};
pub use settings::{
    ChatSettings, DEFAULT_SYSTEM_PROMPT, DatabaseSettings, LlmSettings, LoggingSettings,
    ServerSettings, Settings,
};
