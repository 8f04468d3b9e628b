use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Errors surfaced to API clients as `{"error": <kind>, "message": <text>}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    MalformedInput(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("User with this email already exists")]
    DuplicateUser,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Stable machine-readable kind for clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MalformedInput(_) => "malformed_input",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::DuplicateUser => "duplicate_user",
            ApiError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthenticated(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::DuplicateUser => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal detail stays in the logs; the client gets an opaque message.
        let message = match &self {
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({ "error": self.kind(), "message": message }));
        (self.status(), body).into_response()
    }
}
