use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::ports::{GatewayError, ImageRequest, ModelGateway};
use crate::domain::InlineImage;
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::extractors::AuthenticatedUser;
use crate::presentation::state::AppState;

use super::dto::{GenerateImageRequest, GenerateImageResponse};
use super::error_response::{error_response, invalid_body};

#[tracing::instrument(skip(state, payload), fields(user_id = %user_id))]
pub async fn generate_image_handler<G>(
    State(state): State<AppState<G>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    payload: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Response
where
    G: ModelGateway + 'static,
{
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_body(rejection),
    };

    let Some(prompt) = request.prompt.filter(|p| !p.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Prompt is required");
    };

    let source_image = match request.source_image.as_deref().map(InlineImage::parse) {
        None => None,
        Some(Ok(image)) => Some(image),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Rejecting undecodable source image");
            return error_response(StatusCode::BAD_REQUEST, "Invalid source image");
        }
    };

    tracing::debug!(prompt = %sanitize_prompt(&prompt), "Generating image");

    let image_request = ImageRequest {
        prompt,
        source_image,
    };
    match state.model_gateway.generate_image(&image_request).await {
        Ok(image) => {
            tracing::info!(mime_type = %image.mime_type, bytes = image.bytes.len(), "Image generated");
            (StatusCode::OK, Json(GenerateImageResponse::from(&image))).into_response()
        }
        Err(GatewayError::NoImageData) => {
            tracing::warn!("Image model returned no image data");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "No image data in response")
        }
        Err(e) => {
            tracing::error!(error = %e, "Image generation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate image")
        }
    }
}
