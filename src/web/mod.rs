//! Web API module for Cloudstore.
//!
//! The HTTP surface over the credential store, token registry and file
//! service: login/logout, listing, and upload/download/delete/rename.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
