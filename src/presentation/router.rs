use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::ports::ModelGateway;
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    create_conversation_handler, delete_conversation_handler, generate_image_handler,
    get_conversation_handler, health_handler, list_conversations_handler, send_message_handler,
};
use crate::presentation::state::AppState;

pub fn create_router<G>(state: AppState<G>) -> Router
where
    G: ModelGateway + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/conversations",
            get(list_conversations_handler::<G>).post(create_conversation_handler::<G>),
        )
        .route(
            "/api/conversations/{id}",
            get(get_conversation_handler::<G>).delete(delete_conversation_handler::<G>),
        )
        .route(
            "/api/conversations/{id}/messages",
            post(send_message_handler::<G>),
        )
        .route("/api/generate-image", post(generate_image_handler::<G>))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
