//! Blob storage for Cloudstore.
//!
//! Blobs live in one directory per owner, keyed by the literal filename:
//! ```text
//! {root}/
//! ├── 1/
//! │   ├── a.txt
//! │   └── report.pdf
//! └── 2/
//!     └── a.txt
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::{CloudStoreError, Result};

/// Blob store rooted at a configured directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    /// Root directory of the blob tree.
    root: PathBuf,
}

impl BlobStore {
    /// Create a new BlobStore with the given root.
    ///
    /// The root directory will be created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        Ok(Self { root })
    }

    /// Get the root of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the blob for `(owner_id, filename)`.
    ///
    /// Callers must validate the filename first.
    pub fn path_for(&self, owner_id: i64, filename: &str) -> PathBuf {
        self.root.join(owner_id.to_string()).join(filename)
    }

    /// Write a blob, creating the owner directory as needed.
    ///
    /// Overwrites an existing blob at the same path. The content goes to a
    /// temporary sibling first and is renamed into place, so concurrent
    /// writers never interleave: the last rename wins.
    pub fn write(&self, path: &Path, content: &[u8]) -> Result<()> {
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        // Fixed-length name: a 255-byte leaf must still fit.
        let temp_path = parent.join(format!(".tmp.{}", uuid::Uuid::new_v4()));

        fs::write(&temp_path, content)?;
        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        Ok(())
    }

    /// Read a blob.
    ///
    /// Fails with `NotFound` if no blob exists at the path.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>> {
        match fs::read(path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CloudStoreError::NotFound(format!("blob {}", path.display())))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it didn't exist.
    pub fn delete(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Move a blob with a filesystem rename.
    ///
    /// Returns `false` without touching anything if the source is absent.
    pub fn move_blob(&self, from: &Path, to: &Path) -> Result<bool> {
        if !from.exists() {
            return Ok(false);
        }

        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(from, to)?;

        Ok(true)
    }

    /// Check if a blob exists.
    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
