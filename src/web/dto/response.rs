//! Response DTOs for Web API.

use serde::Serialize;

use crate::file::FileMetadata;

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for the `auth-token` header.
    #[serde(rename = "auth-token")]
    pub auth_token: String,
}

/// Plain message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Create a new message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One entry of `GET /list`.
#[derive(Debug, Serialize)]
pub struct FileEntry {
    /// Filename.
    pub filename: String,
    /// File size in bytes.
    pub size: i64,
}

impl From<FileMetadata> for FileEntry {
    fn from(file: FileMetadata) -> Self {
        Self {
            filename: file.filename,
            size: file.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_field_name() {
        let json = serde_json::to_value(LoginResponse {
            auth_token: "abc".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"auth-token": "abc"}));
    }

    #[test]
    fn test_file_entry_shape() {
        let json = serde_json::to_value(FileEntry {
            filename: "a.txt".to_string(),
            size: 2,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"filename": "a.txt", "size": 2}));
    }
}
