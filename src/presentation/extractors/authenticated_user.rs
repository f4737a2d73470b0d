use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;

use crate::domain::UserId;
use crate::presentation::handlers::ErrorResponse;

/// Header carrying the authenticated subject, set by the fronting auth proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserId);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| AuthenticatedUser(UserId::new(v)))
            .ok_or_else(|| {
                tracing::debug!("Rejecting request without authenticated user");
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new("Unauthorized")),
                )
            })
    }
}
