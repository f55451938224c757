use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable caller identity on the request.
    #[error("Unauthorized")]
    Unauthorized,
    /// Entity absent or not owned by the caller. The two cases share one
    /// variant so a response never reveals whether the entity exists.
    #[error("Not Found")]
    NotFound,
    /// Request understood but rejected; the message is safe for the caller.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn missing_fields() -> Self {
        ApiError::Validation("Missing required fields".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Database(e) => {
                error!("database fault: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
            ApiError::Internal(e) => {
                error!("internal fault: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
