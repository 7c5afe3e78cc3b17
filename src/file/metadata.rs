//! File metadata types and repository.
//!
//! Records are unique per `(user_id, filename)`.

use crate::datetime::now_db_string;
use crate::db::{is_unique_violation, DbPool};
use crate::{CloudStoreError, Result};

/// Metadata for a stored file.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileMetadata {
    /// Unique file ID.
    pub id: i64,
    /// Owning user ID.
    pub user_id: i64,
    /// Filename, unique within the owner.
    pub filename: String,
    /// File size in bytes.
    pub size: i64,
    /// Recorded content type.
    pub content_type: String,
    /// When the file was uploaded.
    pub uploaded_at: String,
}

/// Data for creating a new file record.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Owning user ID.
    pub user_id: i64,
    /// Filename.
    pub filename: String,
    /// File size in bytes.
    pub size: i64,
    /// Content type.
    pub content_type: String,
}

impl NewFile {
    /// Create a new NewFile.
    pub fn new(
        user_id: i64,
        filename: impl Into<String>,
        size: i64,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            filename: filename.into(),
            size,
            content_type: content_type.into(),
        }
    }
}

fn map_write_error(e: sqlx::Error, filename: &str) -> CloudStoreError {
    if is_unique_violation(&e) {
        CloudStoreError::AlreadyExists(format!("file {filename}"))
    } else {
        CloudStoreError::Database(e.to_string())
    }
}

/// Repository for file metadata operations.
pub struct FileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// List an owner's files, most recently uploaded first.
    ///
    /// Ties on upload time are broken by record id. A `limit` that is not
    /// positive is ignored.
    pub async fn list(&self, user_id: i64, limit: Option<i64>) -> Result<Vec<FileMetadata>> {
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.filter(|l| *l > 0).unwrap_or(-1);

        let files = sqlx::query_as::<_, FileMetadata>(
            "SELECT id, user_id, filename, size, content_type, uploaded_at
             FROM files
             WHERE user_id = ?
             ORDER BY uploaded_at DESC, id DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .map_err(|e| CloudStoreError::Database(e.to_string()))?;

        Ok(files)
    }

    /// Check if the owner has a file with this name.
    pub async fn exists(&self, user_id: i64, filename: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM files WHERE user_id = ? AND filename = ?)",
        )
        .bind(user_id)
        .bind(filename)
        .fetch_one(self.pool)
        .await
        .map_err(|e| CloudStoreError::Database(e.to_string()))?;

        Ok(exists)
    }

    /// Find a file by owner and name.
    pub async fn find(&self, user_id: i64, filename: &str) -> Result<Option<FileMetadata>> {
        let file = sqlx::query_as::<_, FileMetadata>(
            "SELECT id, user_id, filename, size, content_type, uploaded_at
             FROM files WHERE user_id = ? AND filename = ?",
        )
        .bind(user_id)
        .bind(filename)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| CloudStoreError::Database(e.to_string()))?;

        Ok(file)
    }

    /// Get a file by owner and name, failing with `NotFound` if absent.
    pub async fn get(&self, user_id: i64, filename: &str) -> Result<FileMetadata> {
        self.find(user_id, filename)
            .await?
            .ok_or_else(|| CloudStoreError::NotFound(format!("file {filename}")))
    }

    /// Insert a new file record.
    ///
    /// Fails with `AlreadyExists` if the owner already has the name.
    pub async fn insert(&self, file: &NewFile) -> Result<FileMetadata> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO files (user_id, filename, size, content_type, uploaded_at)
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(file.user_id)
        .bind(&file.filename)
        .bind(file.size)
        .bind(&file.content_type)
        .bind(now_db_string())
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, &file.filename))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| CloudStoreError::NotFound("file".to_string()))
    }

    /// Get a file by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileMetadata>> {
        let file = sqlx::query_as::<_, FileMetadata>(
            "SELECT id, user_id, filename, size, content_type, uploaded_at
             FROM files WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| CloudStoreError::Database(e.to_string()))?;

        Ok(file)
    }

    /// Change a file's name in place.
    pub async fn rename(&self, file: &FileMetadata, new_filename: &str) -> Result<FileMetadata> {
        sqlx::query("UPDATE files SET filename = ? WHERE id = ?")
            .bind(new_filename)
            .bind(file.id)
            .execute(self.pool)
            .await
            .map_err(|e| map_write_error(e, new_filename))?;

        self.get_by_id(file.id)
            .await?
            .ok_or_else(|| CloudStoreError::NotFound(format!("file {new_filename}")))
    }

    /// Delete a file record.
    ///
    /// Returns true if a record was deleted.
    pub async fn remove(&self, file: &FileMetadata) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(file.id)
            .execute(self.pool)
            .await
            .map_err(|e| CloudStoreError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count an owner's files.
    pub async fn count(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| CloudStoreError::Database(e.to_string()))?;

        Ok(count)
    }
}
