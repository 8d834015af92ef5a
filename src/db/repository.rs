//! User repository for sharedrop.
//!
//! This module provides the user queries the identity and quota services need.

use sqlx::SqlitePool;

use super::user::{NewUser, Tier, User};
use crate::{Result, SharedropError};

const USER_COLUMNS: &str = "id, username, password, tier, created_at";

/// Repository for user persistence.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Returns the created user with the assigned ID. A username that is
    /// already taken (compared case-insensitively) fails with `Conflict`.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (username, password, tier) VALUES (?, ?, ?)")
            .bind(&new_user.username)
            .bind(&new_user.password)
            .bind(new_user.tier.as_str())
            .execute(self.pool)
            .await
            .map_err(SharedropError::from)
            .map_err(|e| {
                if e.is_unique_violation() {
                    SharedropError::Conflict("username already taken".to_string())
                } else {
                    e
                }
            })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| SharedropError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let result =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(result)
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? COLLATE NOCASE"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(result)
    }

    /// Check if a username exists (case-insensitive).
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE)",
        )
        .bind(username)
        .fetch_one(self.pool)
        .await?;

        Ok(exists.0)
    }

    /// Set a user's tier.
    ///
    /// Returns the updated user, or None if the user does not exist.
    /// Setting the tier the user already has is not an error.
    pub async fn set_tier(&self, id: i64, tier: Tier) -> Result<Option<User>> {
        let result = sqlx::query("UPDATE users SET tier = ? WHERE id = ?")
            .bind(tier.as_str())
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;

        Ok(count.0)
    }
}
