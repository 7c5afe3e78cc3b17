//! Token authentication middleware.
//!
//! The middleware never rejects a request. It attaches a [`Principal`] when
//! the `auth-token` header resolves to a valid token; handlers that need an
//! identity use the [`AuthUser`] extractor, which answers 401 otherwise.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{parse_token_header, Principal, AUTH_TOKEN_HEADER};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Extractor for authenticated users.
///
/// Use this extractor to require authentication for a handler.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            parts
                .extensions
                .get::<Principal>()
                .cloned()
                .map(AuthUser)
                .ok_or_else(ApiError::unauthorized)
        })
    }
}

/// Read the bearer token from request headers, if any.
pub fn token_from_headers(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_token_header)
}

/// Middleware function resolving the `auth-token` header into a [`Principal`].
pub async fn token_auth(
    state: Arc<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let principal = match token_from_headers(request.headers()) {
        Some(token) => match state.token_registry().resolve_identity(Some(token)).await {
            Ok(Some(principal)) => Some(principal),
            Ok(None) => {
                tracing::warn!(path = %request.uri().path(), "Invalid or expired token");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to resolve token");
                None
            }
        },
        None => None,
    };

    if let Some(principal) = principal {
        tracing::debug!(user = %principal.username, "Request authenticated");
        request.extensions_mut().insert(principal);
    }

    next.run(request).await
}
