//! Cloudstore - per-user cloud file storage
//!
//! Users log in for an opaque bearer token, then upload, list, download,
//! rename and delete files inside their own namespace over HTTP.

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use auth::{
    hash_password, parse_token_header, password_matches, verify_password, CredentialStore,
    PasswordError, Principal, TokenRegistry,
};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{CloudStoreError, Result};
pub use file::{BlobStore, FileMetadata, FileService, UploadRequest};
pub use web::WebServer;
