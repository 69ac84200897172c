//! The uniform response envelope.
//!
//! Every endpoint, success or failure, answers with the same wrapper:
//! `{success, data?, error?, timestamp}`. The timestamp is RFC 3339.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Machine-readable error code carried in failure envelopes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Malformed client input; never reaches the store.
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// Id not present in the store.
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// Unexpected failure during handling.
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION_ERROR"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Internal => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Error body inside a failure envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Uniform success/error wrapper returned by every API operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Payload on success; absent for data-less successes such as delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error details on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    /// When the response was produced.
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    /// Success envelope carrying `data`.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Success envelope with no payload (delete).
    #[must_use]
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Failure envelope.
    #[must_use]
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
            timestamp: Utc::now(),
        }
    }
}
