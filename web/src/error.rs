//! Error types for web handlers.
//!
//! [`ApiError`] bridges between handler failures and the uniform failure
//! envelope, implementing Axum's `IntoResponse` trait.

use crate::envelope::{ApiResponse, ErrorCode};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

/// Application error type for web handlers.
///
/// Carries the HTTP status, the wire error code, and a user-facing
/// message. An optional source error is kept for logging only and never
/// exposed to the client.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<ApiResponse<Todo>>, ApiError> {
///     let todo = store.get(&id).ok_or_else(|| ApiError::not_found(&id))?;
///     Ok(Json(ApiResponse::ok(todo)))
/// }
/// ```
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: ErrorCode,
    message: String,
    source: Option<anyhow::Error>,
}

impl ApiError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, code: ErrorCode, message: String) -> Self {
        Self {
            status,
            code,
            message,
            source: None,
        }
    }

    /// Attach a source error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 `VALIDATION_ERROR` for malformed client input.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::Validation, message.into())
    }

    /// 404 `NOT_FOUND` for an unknown todo id.
    #[must_use]
    pub fn not_found(id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            ErrorCode::NotFound,
            format!("Todo with id {id} not found"),
        )
    }

    /// 500 `INTERNAL_ERROR` for unexpected failures.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Internal,
            message.into(),
        )
    }

    /// HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Wire error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "internal server error"
                );
            }
        }

        let body: ApiResponse<()> = ApiResponse::failure(self.code, self.message);
        (self.status, Json(body)).into_response()
    }
}

/// Anything unexpected becomes an opaque `INTERNAL_ERROR`.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}
