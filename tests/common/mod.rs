//! Test helpers for Web API tests.
//!
//! Builds the full router over an in-memory database and a temporary blob
//! directory, with tier ceilings scaled down to a few KiB.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};
use tempfile::TempDir;

use sharedrop::auth::TokenService;
use sharedrop::file::{BlobStore, LocalBlobStore, ShareIdGenerator};
use sharedrop::quota::QuotaPolicy;
use sharedrop::web::handlers::AppState;
use sharedrop::web::middleware::RateLimitState;
use sharedrop::web::router::create_router;
use sharedrop::Database;

/// JWT secret used by the test server.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// Free tier ceiling in tests.
pub const FREE_CEILING: u64 = 1024;

/// Pro tier ceiling in tests.
pub const PRO_CEILING: u64 = 8 * 1024;

/// A running test application.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub store: Arc<LocalBlobStore>,
    // Keeps the blob directory alive
    _temp: TempDir,
}

impl TestApp {
    /// Number of blobs (finished or partial) in the store.
    pub async fn blob_count(&self) -> usize {
        self.store.list_blobs().await.unwrap().len()
    }

    /// Register a user and return the bearer token.
    pub async fn register(&self, username: &str, password: &str) -> String {
        let response = self
            .server
            .post("/api/register")
            .json(&json!({ "username": username, "password": password }))
            .await;
        response.assert_status_ok();
        get_token(&response.json::<Value>())
    }

    /// Upload `data` as `filename` with the given token.
    pub async fn upload(&self, token: &str, filename: &str, data: &[u8]) -> TestResponse {
        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(data.to_vec())
                .file_name(filename)
                .mime_type("application/octet-stream"),
        );

        self.server
            .post("/api/upload")
            .add_header(AUTHORIZATION, bearer(token))
            .multipart(form)
            .await
    }
}

/// Create a test server with an in-memory database.
pub async fn create_test_server() -> TestApp {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let store = Arc::new(
        LocalBlobStore::new(temp.path())
            .await
            .expect("Failed to create blob store"),
    );

    let tokens = Arc::new(TokenService::new(TEST_SECRET, 900));
    let quota = QuotaPolicy::new(db.clone(), FREE_CEILING, PRO_CEILING);
    let app_state = Arc::new(AppState::new(
        db.clone(),
        store.clone(),
        tokens,
        quota,
        ShareIdGenerator::default(),
    ));

    let router = create_router(app_state, Arc::new(RateLimitState::new(1000)), &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        store,
        _temp: temp,
    }
}

/// Format a bearer authorization value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Get the token from a register or login response.
pub fn get_token(response: &Value) -> String {
    response["token"].as_str().unwrap().to_string()
}
