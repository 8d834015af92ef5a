//! Authentication module for sharedrop.
//!
//! This module provides password hashing, credential validation,
//! bearer token handling and the identity service built on them.

mod identity;
mod password;
mod token;
pub mod validation;

pub use identity::IdentityService;
pub use password::{hash_password, verify_password, PasswordError};
pub use token::{Identity, JwtClaims, TokenService};
pub use validation::ValidationError;
