//! Authentication module for Cloudstore.
//!
//! This module provides password hashing, the credential store and the
//! bearer token registry.

mod credentials;
mod password;
mod token;

pub use credentials::CredentialStore;
pub use password::{hash_password, password_matches, verify_password, PasswordError};
pub use token::{
    parse_token_header, Principal, TokenRegistry, AUTH_TOKEN_HEADER, DEFAULT_TOKEN_TTL_HOURS,
    ROLE_USER,
};
