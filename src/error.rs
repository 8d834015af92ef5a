//! Error types for sharedrop.

use thiserror::Error;

use crate::db::Tier;

/// Common error type for sharedrop.
#[derive(Error, Debug)]
pub enum SharedropError {
    /// Database error.
    ///
    /// Errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or rejected credential (login failure, no bearer token).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A presented token failed verification.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Validation error for user input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Uniqueness conflict (duplicate username, exhausted share id retries).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Upload exceeds the ceiling of the owner's tier.
    #[error("file exceeds the {tier} tier limit of {ceiling} bytes")]
    TooLarge {
        /// Byte ceiling that was exceeded.
        ceiling: u64,
        /// Tier the ceiling belongs to.
        tier: Tier,
    },

    /// Blob storage or metadata commit failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SharedropError {
    /// Returns true if the error is a UNIQUE constraint violation reported by SQLite.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, SharedropError::Database(msg) if msg.contains("UNIQUE"))
    }

    /// Returns true if the error is a UNIQUE violation on `table.column`.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(
            self,
            SharedropError::Database(msg)
                if msg.contains("UNIQUE") && msg.contains(column)
        )
    }
}

// Conversion from sqlx errors
impl From<sqlx::Error> for SharedropError {
    fn from(e: sqlx::Error) -> Self {
        SharedropError::Database(e.to_string())
    }
}

/// Result type alias for sharedrop operations.
pub type Result<T> = std::result::Result<T, SharedropError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_error_display() {
        let err = SharedropError::Unauthorized("invalid credentials".to_string());
        assert_eq!(err.to_string(), "unauthorized: invalid credentials");
    }

    #[test]
    fn test_invalid_input_error_display() {
        let err = SharedropError::InvalidInput("username is required".to_string());
        assert_eq!(err.to_string(), "invalid input: username is required");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = SharedropError::NotFound("file".to_string());
        assert_eq!(err.to_string(), "file not found");
    }

    #[test]
    fn test_too_large_error_display() {
        let err = SharedropError::TooLarge {
            ceiling: 1024,
            tier: Tier::Free,
        };
        assert_eq!(
            err.to_string(),
            "file exceeds the free tier limit of 1024 bytes"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SharedropError = io_err.into();
        assert!(matches!(err, SharedropError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_unique_violation_detection() {
        let err = SharedropError::Database(
            "error returned from database: (code: 2067) UNIQUE constraint failed: users.username"
                .to_string(),
        );
        assert!(err.is_unique_violation());
        assert!(!SharedropError::Database("disk I/O error".to_string()).is_unique_violation());
        assert!(!SharedropError::Conflict("UNIQUE".to_string()).is_unique_violation());
    }

    #[test]
    fn test_unique_violation_on_column() {
        let err = SharedropError::Database(
            "error returned from database: (code: 2067) UNIQUE constraint failed: files.stored_name"
                .to_string(),
        );
        assert!(err.is_unique_violation_on("files.stored_name"));
        assert!(!err.is_unique_violation_on("files.share_id"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(SharedropError::Forbidden("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
