use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::application::WebhookError;
use crate::ports::swap::SwapError;
use crate::ports::webhook::VerifyError;

/// Error response with a fixed JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    /// `{ "error": message }`
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self { status, body: json!({ "error": message }) }
    }

    /// `{ "message": message }`
    pub fn message(status: StatusCode, message: &str) -> Self {
        Self { status, body: json!({ "message": message }) }
    }

    /// Upstream swap failures keep the upstream status
    pub fn from_swap(err: SwapError, label: &str) -> Self {
        match err {
            SwapError::Upstream { status, details } => Self {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                body: json!({ "error": label, "details": details }),
            },
            SwapError::ApiError(message) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: json!({ "error": "Internal server error", "message": message }),
            },
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::Verify(VerifyError::InvalidData(_) | VerifyError::InvalidEventData(_)) => {
                ApiError::error(StatusCode::BAD_REQUEST, "Invalid request data")
            }
            WebhookError::Verify(VerifyError::InvalidAppKey) => ApiError::error(StatusCode::FORBIDDEN, "Invalid app key"),
            WebhookError::Verify(VerifyError::VerifyAppKey(_)) => {
                ApiError::error(StatusCode::INTERNAL_SERVER_ERROR, "Verification error, will retry")
            }
            WebhookError::Store(_) => ApiError::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
