//! Account tier handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::web::dto::UserStatusResponse;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /api/user/status - Current tier and upload ceiling.
pub async fn user_status(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<UserStatusResponse>, ApiError> {
    let status = state.quota.status(identity.user_id).await?;
    Ok(Json(status.into()))
}

/// POST /api/user/upgrade - Move to the pro tier.
///
/// Payment is handled elsewhere; calling this again is harmless.
pub async fn upgrade(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<UserStatusResponse>, ApiError> {
    let status = state.quota.upgrade(identity.user_id).await?;
    Ok(Json(status.into()))
}
