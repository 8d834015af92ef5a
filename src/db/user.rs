//! User model for sharedrop.
//!
//! This module defines the User struct and the Tier enum that gates upload size.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Account tier controlling the upload ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Default tier for new accounts.
    #[default]
    Free,
    /// Upgraded tier.
    Pro,
}

impl Tier {
    /// Convert tier to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
        }
    }

    /// Whether this is the pro tier.
    pub fn is_pro(&self) -> bool {
        *self == Tier::Pro
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            _ => Err(format!("unknown tier: {s}")),
        }
    }
}

impl TryFrom<String> for Tier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A registered user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique, case-insensitive).
    pub username: String,
    /// Password hash (Argon2 PHC string).
    pub password: String,
    /// Account tier.
    #[sqlx(try_from = "String")]
    pub tier: Tier,
    /// Account creation timestamp (SQLite `datetime('now')`, UTC).
    pub created_at: String,
}

impl User {
    /// Whether the user is on the pro tier.
    pub fn is_pro(&self) -> bool {
        self.tier.is_pro()
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Password hash (must already be hashed).
    pub password: String,
    /// Initial tier (defaults to Free).
    pub tier: Tier,
}

impl NewUser {
    /// Create a new free-tier user.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            tier: Tier::Free,
        }
    }

    /// Set the initial tier.
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }
}
