//! Authentication handlers.

use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use crate::web::dto::{LoginRequest, LoginResponse, MessageResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::token_from_headers;

/// POST /login - Exchange credentials for a token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .credentials()
        .authenticate(&req.login, &req.password)
        .await
        .map_err(|e| ApiError::from_error(e, "Error login"))?;

    let auth_token = state
        .token_registry()
        .issue(&user)
        .await
        .map_err(|e| ApiError::from_error(e, "Error login"))?;

    tracing::info!(user = %user.username, "User logged in");
    Ok(Json(LoginResponse { auth_token }))
}

/// POST /logout - Revoke the presented token.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = token_from_headers(&headers)
        .ok_or_else(|| ApiError::bad_request("Missing auth-token header"))?;

    state
        .token_registry()
        .revoke(token)
        .await
        .map_err(|e| ApiError::from_error(e, "Error logout"))?;

    Ok(Json(MessageResponse::new("Logged out successfully")))
}
