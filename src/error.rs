//! Error types for Cloudstore.

use thiserror::Error;

/// Common error type for Cloudstore.
#[derive(Error, Debug)]
pub enum CloudStoreError {
    /// Database error.
    ///
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error from the blob store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No valid identity is attached to the request.
    #[error("unauthorized error")]
    Unauthenticated,

    /// Login or password did not match.
    #[error("invalid login or password")]
    InvalidCredentials,

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Resource already exists within its owner scope.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Empty input where content is required.
    #[error("{0} is empty")]
    EmptyInput(String),

    /// Metadata and blob disagree.
    #[error("storage inconsistency: {0}")]
    StorageInconsistency(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CloudStoreError {
    /// Whether the error is the caller's fault (reported as a client error).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CloudStoreError::InvalidCredentials
                | CloudStoreError::NotFound(_)
                | CloudStoreError::AlreadyExists(_)
                | CloudStoreError::EmptyInput(_)
                | CloudStoreError::Validation(_)
        )
    }
}

// Conversion from sqlx errors
impl From<sqlx::Error> for CloudStoreError {
    fn from(e: sqlx::Error) -> Self {
        CloudStoreError::Database(e.to_string())
    }
}

/// Result type alias for Cloudstore operations.
pub type Result<T> = std::result::Result<T, CloudStoreError>;
