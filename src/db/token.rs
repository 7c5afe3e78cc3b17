//! Bearer token repository.
//!
//! Tokens are never physically removed; logout clears the `active` flag.

use super::{is_unique_violation, DbPool};
use crate::datetime::now_db_string;
use crate::{CloudStoreError, Result};

/// Bearer token entity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Token {
    /// Token ID.
    pub id: i64,
    /// Token string.
    pub token: String,
    /// Owning user ID.
    pub user_id: i64,
    /// Expiration timestamp.
    pub expires_at: String,
    /// Cleared on logout.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: String,
}

/// New token for creation.
pub struct NewToken {
    /// Owning user ID.
    pub user_id: i64,
    /// Token string.
    pub token: String,
    /// Expiration timestamp.
    pub expires_at: String,
}

/// Repository for token operations.
pub struct TokenRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new active token.
    ///
    /// Fails with `AlreadyExists` if the token string is already taken.
    pub async fn create(&self, new_token: &NewToken) -> Result<Token> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO tokens (token, user_id, expires_at, active, created_at)
             VALUES (?, ?, ?, 1, ?) RETURNING id",
        )
        .bind(&new_token.token)
        .bind(new_token.user_id)
        .bind(&new_token.expires_at)
        .bind(now_db_string())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CloudStoreError::AlreadyExists("token".to_string())
            } else {
                CloudStoreError::Database(e.to_string())
            }
        })?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| CloudStoreError::NotFound("token".to_string()))
    }

    /// Get a token by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Token>> {
        let token = sqlx::query_as::<_, Token>(
            "SELECT id, token, user_id, expires_at, active, created_at
             FROM tokens WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| CloudStoreError::Database(e.to_string()))?;

        Ok(token)
    }

    /// Get a token by token string, regardless of state.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<Token>> {
        let result = sqlx::query_as::<_, Token>(
            "SELECT id, token, user_id, expires_at, active, created_at
             FROM tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| CloudStoreError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get a token that is active and not yet expired at `now`.
    pub async fn get_valid_token(&self, token: &str, now: &str) -> Result<Option<Token>> {
        let result = sqlx::query_as::<_, Token>(
            "SELECT id, token, user_id, expires_at, active, created_at
             FROM tokens
             WHERE token = ?
               AND active = 1
               AND expires_at > ?",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| CloudStoreError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Deactivate a token.
    ///
    /// Returns false if no active token matched.
    pub async fn deactivate(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE tokens SET active = 0 WHERE token = ? AND active = 1")
            .bind(token)
            .execute(self.pool)
            .await
            .map_err(|e| CloudStoreError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
