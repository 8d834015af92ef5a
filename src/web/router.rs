//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    download, get_file, list_files, login, register, upgrade, upload, user_status, AppState,
    MULTIPART_OVERHEAD,
};
use super::middleware::{
    auth_rate_limit, create_cors_layer, jwt_auth, security_headers, RateLimitState,
};

/// Create the main API router.
///
/// Routes are mounted under `/api`; `/health` sits beside them.
pub fn create_router(
    app_state: Arc<AppState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    // Credential routes, rate limited per client IP
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .layer(middleware::from_fn(move |req, next| {
            auth_rate_limit(rate_limit.clone(), req, next)
        }));

    let upload_limit = app_state.quota.max_ceiling().saturating_add(MULTIPART_OVERHEAD);
    let upload_limit = usize::try_from(upload_limit).unwrap_or(usize::MAX);
    let upload_routes = Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(upload_limit));

    let file_routes = Router::new()
        .route("/files", get(list_files))
        .route("/files/:share_id", get(get_file))
        .route("/download/:share_id", get(download));

    let user_routes = Router::new()
        .route("/user/status", get(user_status))
        .route("/user/upgrade", post(upgrade));

    let api_routes = Router::new()
        .merge(auth_routes)
        .merge(upload_routes)
        .merge(file_routes)
        .merge(user_routes);

    let tokens = app_state.tokens().clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers))
                .layer(middleware::from_fn(move |req, next| {
                    jwt_auth(tokens.clone(), req, next)
                })),
        )
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenService;
    use crate::db::Database;
    use crate::file::{LocalBlobStore, ShareIdGenerator};
    use crate::quota::QuotaPolicy;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    async fn app() -> (TempDir, Router) {
        let temp = TempDir::new().unwrap();
        let db = Database::open_in_memory().await.unwrap();
        let store = Arc::new(LocalBlobStore::new(temp.path()).await.unwrap());
        let tokens = Arc::new(TokenService::new("router-test-secret", 3600));
        let quota = QuotaPolicy::new(db.clone(), 1024, 4096);
        let state = AppState::new(db, store, tokens, quota, ShareIdGenerator::default());

        let router = create_router(Arc::new(state), Arc::new(RateLimitState::new(2)), &[]);
        (temp, router)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (_temp, router) = app().await;

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_security_headers_applied() {
        let (_temp, router) = app().await;

        let response = router
            .oneshot(Request::get("/api/files").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_login_rate_limited() {
        let (_temp, router) = app().await;

        let mut last = StatusCode::OK;
        for _ in 0..3 {
            let request = Request::post("/api/login")
                .header("content-type", "application/json")
                .header("x-forwarded-for", "10.0.0.7")
                .body(Body::from(r#"{"username":"nobody","password":"pw"}"#))
                .unwrap();
            last = router.clone().oneshot(request).await.unwrap().status();
        }
        assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);
    }
}
