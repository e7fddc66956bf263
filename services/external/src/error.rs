use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// One field-level problem in a report body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// External service error variants mapped to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum ExternalError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("parsing failure: {0}")]
    Parsing(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ExternalError {
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for ExternalError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                axum::Json(serde_json::json!({ "error": "unauthorized" })),
            )
                .into_response(),
            Self::Validation(errors) => {
                let details: Vec<serde_json::Value> = errors
                    .iter()
                    .map(|e| serde_json::json!({ e.field.clone(): e.message.clone() }))
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    axum::Json(serde_json::json!({
                        "error": "validation failed",
                        "details": details,
                    })),
                )
                    .into_response()
            }
            Self::Parsing(message) => (
                StatusCode::BAD_REQUEST,
                axum::Json(serde_json::json!({
                    "error": "malformed request body",
                    "details": [{ "body": message }],
                })),
            )
                .into_response(),
            Self::Internal(err) => {
                // 4xx are expected client errors; only server faults get logged here.
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(serde_json::json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
