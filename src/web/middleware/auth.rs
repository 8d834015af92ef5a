//! Bearer token authentication.

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{Identity, TokenService};
use crate::web::error::ApiError;

/// Extractor for authenticated users.
///
/// A missing or non-bearer `Authorization` header is rejected with 401; a
/// token that fails verification with 403.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token =
            bearer_token(parts).ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;

        // Token service from extensions (set by middleware)
        let tokens = parts
            .extensions
            .get::<Arc<TokenService>>()
            .ok_or_else(|| ApiError::internal("Token service not configured"))?;

        let identity = tokens.verify(token)?;
        Ok(AuthUser(identity))
    }
}

/// Middleware function to inject the token service into request extensions.
pub async fn jwt_auth(
    tokens: Arc<TokenService>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(tokens);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::{middleware, routing::get, Router};
    use tower::util::ServiceExt;

    async fn whoami(AuthUser(identity): AuthUser) -> String {
        identity.username
    }

    fn app(tokens: Arc<TokenService>) -> Router {
        Router::new()
            .route("/me", get(whoami))
            .layer(middleware::from_fn(move |req, next| {
                jwt_auth(tokens.clone(), req, next)
            }))
    }

    async fn status_for(tokens: Arc<TokenService>, header: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().uri("/me");
        if let Some(h) = header {
            builder = builder.header(AUTHORIZATION, h);
        }
        app(tokens)
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_valid_token() {
        let tokens = Arc::new(TokenService::new("secret", 60));
        let token = tokens.issue(1, "alice").unwrap();

        let status = status_for(tokens.clone(), Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);

        let status = status_for(tokens, Some(&format!("bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let tokens = Arc::new(TokenService::new("secret", 60));
        assert_eq!(status_for(tokens.clone(), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(tokens.clone(), Some("Basic dXNlcjpwdw==")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(tokens, Some("Bearer ")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_bad_token_is_forbidden() {
        let tokens = Arc::new(TokenService::new("secret", 60));
        let foreign = TokenService::new("other-secret", 60).issue(1, "mallory").unwrap();

        assert_eq!(
            status_for(tokens.clone(), Some("Bearer not-a-jwt")).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(tokens, Some(&format!("Bearer {foreign}"))).await,
            StatusCode::FORBIDDEN
        );
    }
}
