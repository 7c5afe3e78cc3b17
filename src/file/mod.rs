//! File management module for Cloudstore.
//!
//! This module ties two storage surfaces together under one owner scope:
//! - Metadata records (filename, size, content type, upload time)
//! - Blobs on disk at `{root}/{owner_id}/{filename}`

mod metadata;
mod service;
mod storage;

pub use metadata::{FileMetadata, FileRepository, NewFile};
pub use service::{Download, FileService, UploadRequest};
pub use storage::BlobStore;

use crate::{CloudStoreError, Result};

/// Maximum length for a filename (in bytes).
pub const MAX_FILENAME_BYTES: usize = 255;

/// Default maximum file size (100MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Content type used when none is declared or guessable.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Check that a filename is safe to use as a blob path leaf.
///
/// Rejects empty names, names over 255 bytes, `.` and `..`, path separators,
/// NUL and other control characters.
pub fn validate_filename(filename: &str) -> Result<()> {
    if filename.is_empty() {
        return Err(CloudStoreError::Validation(
            "filename must not be empty".to_string(),
        ));
    }
    if filename.len() > MAX_FILENAME_BYTES {
        return Err(CloudStoreError::Validation(format!(
            "filename must be at most {MAX_FILENAME_BYTES} bytes"
        )));
    }
    if filename == "." || filename == ".." {
        return Err(CloudStoreError::Validation(format!(
            "invalid filename: {filename}"
        )));
    }
    if filename
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(CloudStoreError::Validation(
            "filename must not contain path separators or control characters".to_string(),
        ));
    }
    Ok(())
}

/// Pick the content type for an upload.
///
/// Prefers the declared type, then a guess from the filename extension.
pub fn resolve_content_type(declared: Option<&str>, filename: &str) -> String {
    match declared.map(str::trim).filter(|ct| !ct.is_empty()) {
        Some(ct) => ct.to_string(),
        None => mime_guess::from_path(filename)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string(),
    }
}
