//! Account registration, login and token verification.

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::password::{
    dummy_hash, hash_password_async, verify_password_async, PasswordError,
};
use crate::auth::token::{Identity, TokenService};
use crate::auth::validation::{validate_credentials, validate_password, validate_username};
use crate::db::{Database, NewUser, UserRepository};
use crate::{Result, SharedropError};

/// Message returned for every failed login, whatever the cause.
const INVALID_CREDENTIALS: &str = "invalid username or password";

/// Registers and authenticates users, and verifies their bearer tokens.
#[derive(Clone)]
pub struct IdentityService {
    db: Database,
    tokens: Arc<TokenService>,
}

impl IdentityService {
    /// Create a new identity service.
    pub fn new(db: Database, tokens: Arc<TokenService>) -> Self {
        Self { db, tokens }
    }

    /// The token service used for issuing and verifying tokens.
    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Register a new account and return a token for it.
    ///
    /// Fails with `InvalidInput` on empty or malformed credentials and
    /// `Conflict` if the username is taken (case-insensitive).
    pub async fn register(&self, username: &str, password: &str) -> Result<String> {
        let username = validate_credentials(username, password)?;

        let repo = UserRepository::new(self.db.pool());
        if repo.username_exists(username).await? {
            return Err(SharedropError::Conflict(
                "username already taken".to_string(),
            ));
        }

        let hash = hash_password_async(password.to_string())
            .await
            .map_err(password_failure)?;

        // A concurrent registration can still win the race; the UNIQUE
        // index turns that into Conflict inside `create`.
        let user = repo.create(&NewUser::new(username, hash)).await?;
        info!(user_id = user.id, username = %user.username, "User registered");

        self.tokens.issue(user.id, &user.username)
    }

    /// Check a username/password pair and return a fresh token.
    ///
    /// Unknown usernames and wrong passwords fail with the same
    /// `Unauthorized` error.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String> {
        let (username, password) = match (validate_username(username), validate_password(password))
        {
            (Ok(u), Ok(())) => (u, password),
            _ => return Err(SharedropError::Unauthorized(INVALID_CREDENTIALS.to_string())),
        };

        let repo = UserRepository::new(self.db.pool());
        let user = repo.get_by_username(username).await?;

        let Some(user) = user else {
            // Spend the same hashing time as a real check.
            if let Some(dummy) = dummy_hash() {
                let _ = verify_password_async(password.to_string(), dummy.to_string()).await;
            }
            warn!(username = %username, "Login failed");
            return Err(SharedropError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        match verify_password_async(password.to_string(), user.password.clone()).await {
            Ok(()) => {}
            Err(PasswordError::VerificationFailed) => {
                warn!(username = %username, "Login failed");
                return Err(SharedropError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
            Err(e) => return Err(password_failure(e)),
        }

        info!(user_id = user.id, username = %user.username, "User logged in");
        self.tokens.issue(user.id, &user.username)
    }

    /// Verify a bearer token.
    ///
    /// Fails with `Forbidden` on a bad signature, malformed payload or expiry.
    pub fn verify(&self, token: &str) -> Result<Identity> {
        self.tokens.verify(token)
    }
}

fn password_failure(e: PasswordError) -> SharedropError {
    tracing::error!("Password hashing failed: {}", e);
    SharedropError::Storage("password processing failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> IdentityService {
        let db = Database::open_in_memory().await.unwrap();
        IdentityService::new(db, Arc::new(TokenService::new("test-secret", 3600)))
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let service = setup().await;

        let token = service.register("alice", "pw").await.unwrap();
        let identity = service.verify(&token).unwrap();
        assert_eq!(identity.username, "alice");

        let token = service.authenticate("alice", "pw").await.unwrap();
        assert_eq!(service.verify(&token).unwrap(), identity);
    }

    #[tokio::test]
    async fn test_register_trims_username() {
        let service = setup().await;

        let token = service.register("  bob ", "pw").await.unwrap();
        assert_eq!(service.verify(&token).unwrap().username, "bob");
        assert!(service.authenticate("bob", "pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_register_duplicate_case_insensitive() {
        let service = setup().await;

        service.register("carol", "pw").await.unwrap();
        let result = service.register("CAROL", "other").await;
        assert!(matches!(result, Err(SharedropError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_empty_fields() {
        let service = setup().await;

        assert!(matches!(
            service.register("", "pw").await,
            Err(SharedropError::InvalidInput(_))
        ));
        assert!(matches!(
            service.register("dave", "").await,
            Err(SharedropError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_password_is_not_stored_in_plaintext() {
        let service = setup().await;
        service.register("erin", "plain-secret").await.unwrap();

        let repo = UserRepository::new(service.db.pool());
        let user = repo.get_by_username("erin").await.unwrap().unwrap();
        assert_ne!(user.password, "plain-secret");
        assert!(user.password.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_indistinguishable() {
        let service = setup().await;
        service.register("frank", "right").await.unwrap();

        let wrong_password = service.authenticate("frank", "wrong").await.unwrap_err();
        let unknown_user = service.authenticate("nobody", "wrong").await.unwrap_err();

        assert!(matches!(wrong_password, SharedropError::Unauthorized(_)));
        assert!(matches!(unknown_user, SharedropError::Unauthorized(_)));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_authenticate_empty_password() {
        let service = setup().await;
        service.register("grace", "pw").await.unwrap();

        assert!(matches!(
            service.authenticate("grace", "").await,
            Err(SharedropError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage() {
        let service = setup().await;
        assert!(matches!(
            service.verify("garbage"),
            Err(SharedropError::Forbidden(_))
        ));
    }
}
