//! Validation utilities for Web API DTOs.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::auth::validation::{validate_password, validate_username};
use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// This extractor deserializes the request body as JSON and then validates it
/// using the `validator` crate. Both failures answer with `INVALID_INPUT`;
/// validation failures list the offending fields under `details`.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::invalid_input(format!("Invalid JSON: {}", e)))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

// ============================================================================
// Custom Validators
// ============================================================================

/// Validate a username with the account rules.
pub fn valid_username(value: &str) -> Result<(), validator::ValidationError> {
    validate_username(value).map(|_| ()).map_err(|e| {
        validator::ValidationError::new("username").with_message(e.to_string().into())
    })
}

/// Validate a password with the account rules.
pub fn valid_password(value: &str) -> Result<(), validator::ValidationError> {
    validate_password(value).map_err(|e| {
        validator::ValidationError::new("password").with_message(e.to_string().into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::dto::RegisterRequest;

    #[test]
    fn test_valid_username() {
        assert!(valid_username("alice").is_ok());
        assert!(valid_username(" alice ").is_ok());
        assert!(valid_username("").is_err());
        assert!(valid_username("al ice").is_err());
    }

    #[test]
    fn test_valid_password() {
        assert!(valid_password("x").is_ok());
        let err = valid_password("").unwrap_err();
        assert_eq!(err.message.unwrap(), "password is required");
    }

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            username: "alice".to_string(),
            password: "pw".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            username: String::new(),
            password: String::new(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
    }
}
