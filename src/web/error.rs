//! Error handling

use crate::core::moderation::ModerationError;
use crate::core::reviews::ReviewError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// The synchronous gate blocked the text.
    ContentRejected { score: f64, reason: String },

    // Resource errors
    NotFound(String),
    AlreadyExists(String),

    // Validation errors
    ValidationError(String),

    // Storage and worker failures
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ContentRejected { score, reason } => {
                let body = Json(json!({
                    "approved": false,
                    "message": "Content rejected by moderation",
                    "score": (score * 100.0).round() / 100.0,
                    "reason": reason,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::AlreadyExists(msg) => (StatusCode::CONFLICT, msg),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<ModerationError> for ApiError {
    fn from(err: ModerationError) -> Self {
        match err {
            ModerationError::ContentRejected { score, reason, .. } => {
                ApiError::ContentRejected { score, reason }
            }
            ModerationError::DuplicateRecord(review_id) => ApiError::AlreadyExists(format!(
                "Review {} already has a moderation record",
                review_id
            )),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}
