use axum::{http::StatusCode, response::Json};
use serde_json::json;
use tonic::Code;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Access denied")]
    Forbidden,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    /// Maps a menu service status onto the REST error it should surface as.
    pub fn from_status(status: tonic::Status) -> Self {
        let message = status.message().to_string();
        match status.code() {
            Code::NotFound => ApiError::NotFound(message),
            Code::InvalidArgument => ApiError::BadRequest(message),
            Code::PermissionDenied => ApiError::Forbidden,
            Code::Unavailable => ApiError::ServiceUnavailable(format!("Menu service error: {message}")),
            Code::DeadlineExceeded => ApiError::UpstreamTimeout(message),
            _ => ApiError::UpstreamFailure(format!("Menu service error: {message}")),
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match &self {
            ApiError::AuthenticationFailed => (
                StatusCode::UNAUTHORIZED,
                "Authentication failed".to_string(),
            ),
            ApiError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Access denied".to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ApiError::UpstreamFailure(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ApiError::UpstreamTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg.clone()),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
