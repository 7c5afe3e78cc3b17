//! Middleware for Web API.

pub mod auth;
pub mod cors;

pub use auth::{token_auth, token_from_headers, AuthUser};
pub use cors::create_cors_layer;
