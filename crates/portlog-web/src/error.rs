use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid multipart request: {0}")]
    Multipart(String),

    #[error(transparent)]
    Core(#[from] portlog_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MissingField(_) => (StatusCode::BAD_REQUEST, "missing_field"),
            Self::Multipart(_) => (StatusCode::BAD_REQUEST, "invalid_multipart"),
            Self::Core(portlog_core::Error::UnsupportedFormat { .. }) => {
                (StatusCode::BAD_REQUEST, "unsupported_format")
            }
            Self::Core(portlog_core::Error::Extraction { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "extraction_error")
            }
            Self::Core(portlog_core::Error::Config(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error")
            }
            Self::Io(_) | Self::Core(portlog_core::Error::Io(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "io_error")
            }
            Self::Core(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.parts();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error_type, %message, "Request failed");
        } else {
            tracing::debug!(error_type, %message, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
