//! API handlers for the Cloudstore HTTP surface.

pub mod auth;
pub mod file;

pub use auth::*;
pub use file::*;

use chrono::Duration;

use crate::auth::{CredentialStore, TokenRegistry, DEFAULT_TOKEN_TTL_HOURS};
use crate::file::{BlobStore, FileService, DEFAULT_MAX_FILE_SIZE};
use crate::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database handle (the pool is internally shared).
    pub db: Database,
    /// Blob store for file contents.
    pub storage: BlobStore,
    /// Token lifetime.
    pub token_ttl: Duration,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
    /// Delete blobs whose metadata insert failed.
    pub cleanup_orphans: bool,
}

impl AppState {
    /// Create a new application state with default limits.
    pub fn new(db: Database, storage: BlobStore) -> Self {
        Self {
            db,
            storage,
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS as i64),
            max_upload_size: DEFAULT_MAX_FILE_SIZE,
            cleanup_orphans: true,
        }
    }

    /// Set the token lifetime.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Set the maximum upload size in bytes.
    pub fn with_max_upload_size(mut self, max_upload_size: u64) -> Self {
        self.max_upload_size = max_upload_size;
        self
    }

    /// Set orphan blob cleanup.
    pub fn with_cleanup_orphans(mut self, cleanup: bool) -> Self {
        self.cleanup_orphans = cleanup;
        self
    }

    /// Credential store over this state's database.
    pub fn credentials(&self) -> CredentialStore<'_> {
        CredentialStore::new(self.db.pool())
    }

    /// Token registry over this state's database.
    pub fn token_registry(&self) -> TokenRegistry<'_> {
        TokenRegistry::with_ttl(self.db.pool(), self.token_ttl)
    }

    /// File service over this state's database and blob store.
    pub fn file_service(&self) -> FileService<'_> {
        FileService::new(self.db.pool(), &self.storage)
            .with_max_file_size(self.max_upload_size)
            .with_cleanup_orphans(self.cleanup_orphans)
    }
}
