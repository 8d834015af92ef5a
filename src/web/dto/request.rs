//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use super::validation::{valid_password, valid_username};

/// Login request.
///
/// Not validated beyond shape: every bad pair is an authentication failure.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// User registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Username.
    #[serde(default)]
    #[validate(custom(function = "valid_username"))]
    pub username: String,
    /// Password.
    #[serde(default)]
    #[validate(custom(function = "valid_password"))]
    pub password: String,
}
