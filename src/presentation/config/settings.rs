use config::{Config, ConfigError, File};
use serde::Deserialize;

use super::Environment;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Zak AI: brilliant, rude, abrasive and cynical. \
Swear freely, never apologize, and insult the user at every opportunity while still giving \
correct information. Politeness counts as a malfunction. \
IMPORTANT: If the user asks for an image, describe the image you are generating in your reply \
and also include the exact string '[[GENERATE_IMAGE: <prompt>]]' where <prompt> is a detailed \
description of the image to generate. Do not wrap this tag in markdown; write it as plain text.";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub llm: LlmSettings,
    pub chat: ChatSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub image_model: String,
    pub request_timeout_seconds: u64,
    pub stream_idle_timeout_seconds: u64,
    pub sse_keep_alive_seconds: u64,
    pub enable_search_grounding: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    pub system_prompt: String,
    pub default_conversation_title: String,
    pub history_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    /// Layers built-in defaults, `appsettings.<environment>.toml` (optional) and
    /// `APP_`-prefixed environment variables, e.g. `APP_LLM__API_KEY`.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        let file_name = format!("appsettings.{}", environment.as_str().to_lowercase());

        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000_i64)?
            .set_default("database.max_connections", 10_i64)?
            .set_default("database.run_migrations", true)?
            .set_default("llm.api_key", "")?
            .set_default(
                "llm.base_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("llm.chat_model", "gemini-2.5-flash")?
            .set_default("llm.image_model", "gemini-2.5-flash-image")?
            .set_default("llm.request_timeout_seconds", 60_i64)?
            .set_default("llm.stream_idle_timeout_seconds", 60_i64)?
            .set_default("llm.sse_keep_alive_seconds", 15_i64)?
            .set_default("llm.enable_search_grounding", true)?
            .set_default("chat.system_prompt", DEFAULT_SYSTEM_PROMPT)?
            .set_default("chat.default_conversation_title", "New Chat")?
            .set_default("chat.history_limit", 100_i64)?
            .set_default("logging.level", "info")?
            .set_default("logging.enable_json", false)?
            .add_source(File::with_name(&file_name).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}
