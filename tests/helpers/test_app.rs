use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use zakchat::application::services::ChatService;
use zakchat::infrastructure::llm::MockModelGateway;
use zakchat::infrastructure::persistence::InMemoryConversationRepository;
use zakchat::presentation::config::{
    ChatSettings, DatabaseSettings, LlmSettings, LoggingSettings, ServerSettings, Settings,
};
use zakchat::presentation::{AppState, create_router};

pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseSettings {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            run_migrations: false,
        },
        llm: LlmSettings {
            api_key: "test-key".to_string(),
            base_url: "http://localhost:0".to_string(),
            chat_model: "mock-chat".to_string(),
            image_model: "mock-image".to_string(),
            request_timeout_seconds: 5,
            stream_idle_timeout_seconds: 5,
            sse_keep_alive_seconds: 15,
            enable_search_grounding: false,
        },
        chat: ChatSettings {
            system_prompt: "be rude".to_string(),
            default_conversation_title: "New Chat".to_string(),
            history_limit: 100,
        },
        logging: LoggingSettings {
            level: "debug".to_string(),
            enable_json: false,
        },
    }
}

/// In-process application wired to an in-memory store and a scripted gateway.
pub struct TestApp {
    pub router: Router,
    pub gateway: MockModelGateway,
    pub repository: InMemoryConversationRepository,
}

impl TestApp {
    pub fn new(gateway: MockModelGateway) -> Self {
        let settings = test_settings();
        let repository = InMemoryConversationRepository::new();
        let gateway_handle = Arc::new(gateway.clone());

        let chat_service = ChatService::new(
            Arc::clone(&gateway_handle),
            Arc::new(repository.clone()),
            settings.chat.system_prompt.clone(),
            settings.chat.history_limit,
            Duration::from_secs(settings.llm.stream_idle_timeout_seconds),
        );

        let state = AppState {
            chat_service: Arc::new(chat_service),
            model_gateway: gateway_handle,
            conversation_repository: Arc::new(repository.clone()),
            settings,
        };

        Self {
            router: create_router(state),
            gateway,
            repository,
        }
    }

    /// Serves the router on an ephemeral local port and returns its base URL.
    pub async fn spawn(self) -> (String, Self) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let address = listener.local_addr().expect("Failed to read local address");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Test server failed");
        });
        (format!("http://{}", address), self)
    }
}
