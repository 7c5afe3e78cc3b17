//! Shared helpers for Web API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::http::HeaderName;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};
use tempfile::TempDir;

use cloudstore::config::{Config, ServerConfig};
use cloudstore::web::handlers::AppState;
use cloudstore::web::router::create_router;
use cloudstore::{BlobStore, CredentialStore, Database};

/// Seeded account used by most tests.
pub const USER: &str = "user@example.com";
pub const USER_PASSWORD: &str = "password";

/// Second seeded account.
pub const ADMIN: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin";

/// Base path the API is nested under.
pub const BASE: &str = "/cloud";

/// A running test server and the resources behind it.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub storage: BlobStore,
    /// Keeps the blob root alive for the test's duration.
    pub dir: TempDir,
}

impl TestApp {
    /// Build a test app with default settings.
    pub async fn new() -> Self {
        Self::with_state(|state| state).await
    }

    /// Build a test app, letting the caller adjust the state first.
    pub async fn with_state(configure: impl FnOnce(AppState) -> AppState) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");
        CredentialStore::new(db.pool())
            .seed_default_accounts(&Config::default().auth.seed_users)
            .await
            .expect("Failed to seed accounts");

        let storage = BlobStore::new(dir.path().join("storage")).expect("Failed to create storage");
        let state = configure(AppState::new(db.clone(), storage.clone()));

        let router = create_router(Arc::new(state), &ServerConfig::default());
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            db,
            storage,
            dir,
        }
    }

    /// Log in and return the token.
    pub async fn login(&self, login: &str, password: &str) -> String {
        let response = self
            .server
            .post(&path("/login"))
            .json(&json!({ "login": login, "password": password }))
            .await;
        response.assert_status_ok();

        response.json::<Value>()["auth-token"]
            .as_str()
            .expect("auth-token missing")
            .to_string()
    }

    /// Upload `content` as `filename`.
    pub async fn upload(&self, token: &str, filename: &str, content: &[u8]) -> TestResponse {
        let form = MultipartForm::new().add_text("filename", filename).add_part(
            "file",
            Part::bytes(content.to_vec())
                .file_name(filename)
                .mime_type("text/plain"),
        );

        self.server
            .post(&path("/file"))
            .add_header(auth_header(), token.to_string())
            .multipart(form)
            .await
    }

    /// List the caller's files.
    pub async fn list(&self, token: &str) -> TestResponse {
        self.server
            .get(&path("/list"))
            .add_header(auth_header(), token.to_string())
            .await
    }

    /// Download a file.
    pub async fn download(&self, token: &str, filename: &str) -> TestResponse {
        self.server
            .get(&path("/file"))
            .add_query_param("filename", filename)
            .add_header(auth_header(), token.to_string())
            .await
    }

    /// Rename a file.
    pub async fn rename(&self, token: &str, filename: &str, new_name: &str) -> TestResponse {
        self.server
            .put(&path("/file"))
            .add_query_param("filename", filename)
            .add_header(auth_header(), token.to_string())
            .json(&json!({ "name": new_name }))
            .await
    }

    /// Delete a file.
    pub async fn delete(&self, token: &str, filename: &str) -> TestResponse {
        self.server
            .delete(&path("/file"))
            .add_query_param("filename", filename)
            .add_header(auth_header(), token.to_string())
            .await
    }
}

/// Full path of an API route.
pub fn path(route: &str) -> String {
    format!("{BASE}{route}")
}

/// The `auth-token` header name.
pub fn auth_header() -> HeaderName {
    HeaderName::from_static("auth-token")
}

/// Assert an error body of shape `{message, id}`.
pub fn assert_error(response: &TestResponse, status: u16, message: &str) {
    assert_eq!(response.status_code().as_u16(), status);
    let body = response.json::<Value>();
    assert_eq!(body["id"], status);
    assert_eq!(body["message"], message);
}
