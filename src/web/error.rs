//! API error handling for the sharedrop HTTP interface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::db::Tier;
use crate::SharedropError;

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or missing input (400).
    InvalidInput,
    /// Username already taken (400).
    Conflict,
    /// Missing credential or failed login (401).
    Unauthorized,
    /// Credential presented but rejected (403).
    Forbidden,
    /// Not found (404).
    NotFound,
    /// Upload above the tier ceiling (400).
    TooLarge,
    /// Blob write or metadata commit failed (500).
    StorageFailure,
    /// Too many requests (429).
    RateLimited,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::TooLarge => StatusCode::BAD_REQUEST,
            ErrorCode::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The ceiling an oversized upload ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitDetail {
    /// Ceiling in bytes.
    pub ceiling: u64,
    /// Tier the ceiling belongs to.
    pub tier: Tier,
}

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Field-level validation error details (only present for validation errors).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
    /// Exceeded ceiling (only present for TOO_LARGE).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<LimitDetail>,
}

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<HashMap<String, Vec<String>>>,
    limit: Option<LimitDetail>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            limit: None,
        }
    }

    /// The error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Create a too-large error carrying the exceeded ceiling.
    pub fn too_large(ceiling: u64, tier: Tier) -> Self {
        Self {
            limit: Some(LimitDetail { ceiling, tier }),
            ..Self::new(
                ErrorCode::TooLarge,
                format!("File exceeds the {tier} tier limit of {ceiling} bytes"),
            )
        }
    }

    /// Create a storage failure error.
    pub fn storage_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageFailure, message)
    }

    /// Create a rate limited error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimited, message)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a validation error from validator::ValidationErrors.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let mut details: HashMap<String, Vec<String>> = HashMap::new();

        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<String> = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
                .collect();
            details.insert(field.to_string(), messages);
        }

        let message = details
            .values()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| "Validation failed".to_string());

        Self {
            details: Some(details),
            ..Self::invalid_input(message)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
                details: self.details,
                limit: self.limit,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<SharedropError> for ApiError {
    fn from(err: SharedropError) -> Self {
        match err {
            SharedropError::InvalidInput(msg) => ApiError::invalid_input(msg),
            SharedropError::Conflict(msg) => ApiError::conflict(msg),
            SharedropError::Unauthorized(msg) => ApiError::unauthorized(msg),
            SharedropError::Forbidden(msg) => ApiError::forbidden(msg),
            SharedropError::NotFound(what) => ApiError::not_found(format!("{what} not found")),
            SharedropError::TooLarge { ceiling, tier } => ApiError::too_large(ceiling, tier),
            SharedropError::Storage(msg) => {
                tracing::error!("Storage failure: {}", msg);
                ApiError::storage_failure("The file could not be stored")
            }
            other => {
                tracing::error!("Internal error: {}", other);
                ApiError::internal("An internal error occurred")
            }
        }
    }
}
