//! Credential validation for sharedrop.
//!
//! Usernames and passwords are checked before any hashing or database work.

use thiserror::Error;

use crate::SharedropError;

/// Maximum username length in characters.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Maximum password length in bytes.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty after trimming.
    #[error("username is required")]
    UsernameEmpty,

    /// Username is too long.
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    /// Username contains whitespace or control characters.
    #[error("username must not contain whitespace or control characters")]
    UsernameInvalidChars,

    /// Password is empty.
    #[error("password is required")]
    PasswordEmpty,

    /// Password is too long.
    #[error("password must be at most {MAX_PASSWORD_LENGTH} bytes")]
    PasswordTooLong,
}

impl From<ValidationError> for SharedropError {
    fn from(e: ValidationError) -> Self {
        SharedropError::InvalidInput(e.to_string())
    }
}

/// Validate a username and return its trimmed form.
///
/// Requirements:
/// - Length after trimming: 1-32 characters
/// - No whitespace or control characters
///
/// # Examples
///
/// ```
/// use sharedrop::auth::validation::validate_username;
///
/// assert_eq!(validate_username("  alice ").unwrap(), "alice");
/// assert!(validate_username("   ").is_err());
/// assert!(validate_username("al ice").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<&str, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::UsernameEmpty);
    }
    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if trimmed
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(ValidationError::UsernameInvalidChars);
    }

    Ok(trimmed)
}

/// Validate a password.
///
/// Any non-empty password up to 128 bytes is accepted; it is never trimmed.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordEmpty);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

/// Validate both credentials, returning the trimmed username.
pub fn validate_credentials<'a>(
    username: &'a str,
    password: &str,
) -> Result<&'a str, ValidationError> {
    let username = validate_username(username)?;
    validate_password(password)?;
    Ok(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_valid() {
        assert_eq!(validate_username("john").unwrap(), "john");
        assert_eq!(validate_username("a").unwrap(), "a");
        assert_eq!(validate_username("user.name-123").unwrap(), "user.name-123");
        assert_eq!(validate_username("ユーザー").unwrap(), "ユーザー");
    }

    #[test]
    fn test_validate_username_trims() {
        assert_eq!(validate_username("  bob\t").unwrap(), "bob");
    }

    #[test]
    fn test_validate_username_empty() {
        assert_eq!(validate_username(""), Err(ValidationError::UsernameEmpty));
        assert_eq!(validate_username("   "), Err(ValidationError::UsernameEmpty));
    }

    #[test]
    fn test_validate_username_length() {
        let max = "a".repeat(MAX_USERNAME_LENGTH);
        assert!(validate_username(&max).is_ok());

        let long = "a".repeat(MAX_USERNAME_LENGTH + 1);
        assert_eq!(
            validate_username(&long),
            Err(ValidationError::UsernameTooLong)
        );
    }

    #[test]
    fn test_validate_username_invalid_chars() {
        assert_eq!(
            validate_username("john doe"),
            Err(ValidationError::UsernameInvalidChars)
        );
        assert_eq!(
            validate_username("john\u{0007}"),
            Err(ValidationError::UsernameInvalidChars)
        );
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("x").is_ok());
        assert!(validate_password(" padded ").is_ok());
        assert_eq!(validate_password(""), Err(ValidationError::PasswordEmpty));

        let max = "p".repeat(MAX_PASSWORD_LENGTH);
        assert!(validate_password(&max).is_ok());
        let long = "p".repeat(MAX_PASSWORD_LENGTH + 1);
        assert_eq!(
            validate_password(&long),
            Err(ValidationError::PasswordTooLong)
        );
    }

    #[test]
    fn test_validate_credentials() {
        assert_eq!(validate_credentials(" eve ", "secret").unwrap(), "eve");
        assert!(validate_credentials("eve", "").is_err());
        assert!(validate_credentials("", "secret").is_err());
    }

    #[test]
    fn test_into_invalid_input() {
        let err: SharedropError = ValidationError::PasswordEmpty.into();
        assert!(matches!(err, SharedropError::InvalidInput(ref m) if m == "password is required"));
    }
}
