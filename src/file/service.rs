//! File service for Cloudstore.
//!
//! Every operation resolves the caller's account first, then performs the
//! metadata and blob steps in a fixed order:
//! - upload: existence check, emptiness check, blob write, metadata insert
//! - download: metadata lookup, blob read
//! - delete: metadata lookup, blob delete, metadata delete
//! - rename: both lookups, blob move, metadata update

use tracing::{debug, error, info, warn};

use crate::auth::Principal;
use crate::db::{DbPool, User, UserRepository};
use crate::{CloudStoreError, Result};

use super::metadata::{FileMetadata, FileRepository, NewFile};
use super::storage::BlobStore;
use super::{resolve_content_type, validate_filename, DEFAULT_MAX_FILE_SIZE};

/// Request data for file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Filename within the owner scope.
    pub filename: String,
    /// Declared content type (optional).
    pub content_type: Option<String>,
    /// File content.
    pub content: Vec<u8>,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            content,
        }
    }

    /// Set the declared content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Result of a file download.
#[derive(Debug)]
pub struct Download {
    /// File metadata.
    pub file: FileMetadata,
    /// File content.
    pub content: Vec<u8>,
}

/// Coordinates metadata records and blobs for one owner at a time.
pub struct FileService<'a> {
    pool: &'a DbPool,
    storage: &'a BlobStore,
    max_file_size: u64,
    cleanup_orphans: bool,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(pool: &'a DbPool, storage: &'a BlobStore) -> Self {
        Self {
            pool,
            storage,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            cleanup_orphans: true,
        }
    }

    /// Set the maximum upload size in bytes.
    pub fn with_max_file_size(mut self, max_size: u64) -> Self {
        self.max_file_size = max_size;
        self
    }

    /// Whether to delete the blob when the metadata insert fails.
    pub fn with_cleanup_orphans(mut self, cleanup: bool) -> Self {
        self.cleanup_orphans = cleanup;
        self
    }

    /// Resolve the account behind a principal.
    ///
    /// Fails with `NotFound` if the account vanished after the token was
    /// issued.
    pub async fn resolve_owner(&self, principal: &Principal) -> Result<User> {
        UserRepository::new(self.pool)
            .get_by_id(principal.user_id)
            .await?
            .ok_or_else(|| CloudStoreError::NotFound(format!("user {}", principal.username)))
    }

    /// List the caller's files, most recent first.
    ///
    /// Metadata only; blobs are not touched.
    pub async fn list_files(
        &self,
        principal: &Principal,
        limit: Option<i64>,
    ) -> Result<Vec<FileMetadata>> {
        let owner = self.resolve_owner(principal).await?;
        FileRepository::new(self.pool).list(owner.id, limit).await
    }

    /// Upload a new file.
    ///
    /// # Validation
    /// - Filename: see [`validate_filename`]
    /// - Name must not already exist for the owner (`AlreadyExists`)
    /// - Content must not be empty (`EmptyInput`)
    /// - Size: max configured size
    pub async fn upload(&self, principal: &Principal, request: UploadRequest) -> Result<FileMetadata> {
        let owner = self.resolve_owner(principal).await?;
        validate_filename(&request.filename)?;
        let repo = FileRepository::new(self.pool);

        // Checked before any bytes are written.
        if repo.exists(owner.id, &request.filename).await? {
            return Err(CloudStoreError::AlreadyExists(format!(
                "file {}",
                request.filename
            )));
        }

        if request.content.is_empty() {
            return Err(CloudStoreError::EmptyInput(format!(
                "file {}",
                request.filename
            )));
        }

        let size = request.content.len() as u64;
        if size > self.max_file_size {
            let max_mb = self.max_file_size / 1024 / 1024;
            return Err(CloudStoreError::Validation(format!(
                "file too large (max {max_mb}MB)"
            )));
        }

        let content_type = resolve_content_type(request.content_type.as_deref(), &request.filename);
        let path = self.storage.path_for(owner.id, &request.filename);
        self.storage.write(&path, &request.content)?;

        let new_file = NewFile::new(owner.id, &request.filename, size as i64, content_type);
        match repo.insert(&new_file).await {
            Ok(file) => {
                info!(user = %owner.username, filename = %file.filename, size = file.size, "File uploaded");
                Ok(file)
            }
            Err(e) => {
                self.handle_failed_insert(&path, &e);
                Err(e)
            }
        }
    }

    fn handle_failed_insert(&self, path: &std::path::Path, e: &CloudStoreError) {
        // A concurrent upload of the same name won the insert; the path
        // belongs to its record now.
        if matches!(e, CloudStoreError::AlreadyExists(_)) {
            debug!(path = %path.display(), "Lost upload race, keeping blob");
            return;
        }

        if !self.cleanup_orphans {
            warn!(path = %path.display(), error = %e, "Metadata insert failed, blob left orphaned");
            return;
        }

        match self.storage.delete(path) {
            Ok(_) => debug!(path = %path.display(), "Removed orphaned blob"),
            Err(cleanup_err) => {
                error!(path = %path.display(), error = %cleanup_err, "Failed to remove orphaned blob")
            }
        }
    }

    /// Download a file.
    ///
    /// Fails with `NotFound` without a metadata record, and with
    /// `StorageInconsistency` if the record exists but the blob cannot be read.
    pub async fn download(&self, principal: &Principal, filename: &str) -> Result<Download> {
        let owner = self.resolve_owner(principal).await?;
        validate_filename(filename)?;
        let file = FileRepository::new(self.pool).get(owner.id, filename).await?;

        let path = self.storage.path_for(owner.id, &file.filename);
        let content = self.storage.read(&path).map_err(|e| {
            error!(user = %owner.username, filename = %file.filename, error = %e, "Blob unreadable");
            CloudStoreError::StorageInconsistency(format!(
                "blob for file {} is unreadable",
                file.filename
            ))
        })?;

        Ok(Download { file, content })
    }

    /// Delete a file.
    ///
    /// The blob goes first (tolerating its absence), then the record.
    pub async fn delete(&self, principal: &Principal, filename: &str) -> Result<()> {
        let owner = self.resolve_owner(principal).await?;
        validate_filename(filename)?;
        let repo = FileRepository::new(self.pool);
        let file = repo.get(owner.id, filename).await?;

        let path = self.storage.path_for(owner.id, &file.filename);
        if !self.storage.delete(&path)? {
            warn!(user = %owner.username, filename = %file.filename, "Blob already missing on delete");
        }
        repo.remove(&file).await?;

        info!(user = %owner.username, filename = %file.filename, "File deleted");
        Ok(())
    }

    /// Rename a file.
    ///
    /// The blob is moved first (tolerating its absence), then the record.
    pub async fn rename(
        &self,
        principal: &Principal,
        old_filename: &str,
        new_filename: &str,
    ) -> Result<FileMetadata> {
        let owner = self.resolve_owner(principal).await?;
        validate_filename(old_filename)?;
        validate_filename(new_filename)?;
        let repo = FileRepository::new(self.pool);

        let file = repo.get(owner.id, old_filename).await?;
        if repo.exists(owner.id, new_filename).await? {
            return Err(CloudStoreError::AlreadyExists(format!("file {new_filename}")));
        }

        let from = self.storage.path_for(owner.id, old_filename);
        let to = self.storage.path_for(owner.id, new_filename);
        if !self.storage.move_blob(&from, &to)? {
            warn!(user = %owner.username, filename = %old_filename, "Blob missing on rename");
        }
        let renamed = repo.rename(&file, new_filename).await?;

        info!(user = %owner.username, from = %old_filename, to = %new_filename, "File renamed");
        Ok(renamed)
    }
}
