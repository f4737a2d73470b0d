use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use zakchat::application::ports::ConversationRepository;
use zakchat::application::services::ChatService;
use zakchat::infrastructure::llm::GeminiGateway;
use zakchat::infrastructure::observability::{TracingConfig, init_tracing};
use zakchat::infrastructure::persistence::{
    PgConversationRepository, create_pool, run_migrations,
};
use zakchat::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load configuration")?;

    init_tracing(&TracingConfig::from_settings(environment, &settings.logging));

    if settings.llm.api_key.is_empty() {
        tracing::warn!("llm.api_key is empty; upstream model calls will be rejected");
    }

    let pool = create_pool(&settings.database)
        .await
        .context("Failed to connect to PostgreSQL")?;
    if settings.database.run_migrations {
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
    }

    let conversation_repository: Arc<dyn ConversationRepository> =
        Arc::new(PgConversationRepository::new(pool));
    let model_gateway =
        Arc::new(GeminiGateway::from_settings(&settings.llm).context("Invalid llm settings")?);

    let chat_service = Arc::new(ChatService::new(
        Arc::clone(&model_gateway),
        Arc::clone(&conversation_repository),
        settings.chat.system_prompt.clone(),
        settings.chat.history_limit,
        Duration::from_secs(settings.llm.stream_idle_timeout_seconds),
    ));

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        chat_service,
        model_gateway,
        conversation_repository,
        settings,
    };
    let router = create_router(state);

    tracing::info!(environment = %environment, "Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
