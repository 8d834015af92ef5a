//! Authentication handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::web::dto::{LoginRequest, RegisterRequest, TokenResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /api/register - Create an account and log it in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state
        .identity
        .register(&req.username, &req.password)
        .await?;

    Ok(Json(TokenResponse::bearer(
        token,
        state.tokens().expiry_secs(),
    )))
}

/// POST /api/login - Exchange credentials for a token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state
        .identity
        .authenticate(&req.username, &req.password)
        .await?;

    Ok(Json(TokenResponse::bearer(
        token,
        state.tokens().expiry_secs(),
    )))
}
