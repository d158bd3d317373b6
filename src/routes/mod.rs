pub mod events;
pub mod users;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use daysync_core::DaySyncError;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert core errors to HTTP responses.
pub struct AppError(DaySyncError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DaySyncError::Validation(_) => StatusCode::BAD_REQUEST,
            DaySyncError::NotFound(_) => StatusCode::NOT_FOUND,
            DaySyncError::Delivery(_) | DaySyncError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<DaySyncError> for AppError {
    fn from(err: DaySyncError) -> Self {
        AppError(err)
    }
}

/// The authenticated owner, taken from the `x-user-id` header.
///
/// Stand-in for the auth middleware that normally sits in front of this
/// service; everything below the HTTP boundary takes an explicit owner id.
pub struct OwnerId(pub Uuid);

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(OwnerId)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "missing or invalid x-user-id header".to_string(),
                    }),
                )
            })
    }
}
