//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account name.
    #[validate(length(min = 1, message = "Login is required"))]
    pub login: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Rename request body for `PUT /file`.
#[derive(Debug, Deserialize, Validate)]
pub struct RenameRequest {
    /// New filename.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 bytes"))]
    pub name: String,
}

/// Query for `GET /list`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Maximum number of entries; ignored unless positive.
    pub limit: Option<i64>,
}

/// Query carrying the target filename.
#[derive(Debug, Default, Deserialize)]
pub struct FilenameQuery {
    /// Filename within the caller's scope.
    pub filename: Option<String>,
}
