//! Configuration module for Cloudstore.

use serde::Deserialize;
use std::path::Path;

use crate::{CloudStoreError, Result};

/// Largest accepted `storage.max_upload_size_mb` (1 TiB).
pub const MAX_UPLOAD_SIZE_MB_LIMIT: u64 = 1024 * 1024;

/// Largest accepted `auth.token_ttl_hours` (ten years).
pub const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365 * 10;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path prefix every API route is nested under (empty = root).
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// CORS allowed origins (empty = allow any origin).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_base_path() -> String {
    "/cloud".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_path: default_base_path(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/cloudstore.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the blob tree.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Delete the written blob when the metadata insert fails.
    #[serde(default = "default_cleanup_orphans")]
    pub cleanup_orphans: bool,
}

fn default_storage_path() -> String {
    "./storage".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

fn default_cleanup_orphans() -> bool {
    true
}

impl StorageConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
            cleanup_orphans: default_cleanup_orphans(),
        }
    }
}

/// Account created at startup if absent.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
}

impl SeedUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Token lifetime in hours.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: u64,
    /// Default accounts seeded at startup.
    #[serde(default = "default_seed_users")]
    pub seed_users: Vec<SeedUser>,
}

fn default_token_ttl() -> u64 {
    24
}

fn default_seed_users() -> Vec<SeedUser> {
    vec![
        SeedUser::new("user@example.com", "password"),
        SeedUser::new("admin@example.com", "admin"),
        SeedUser::new("test@example.com", "test"),
    ]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: default_token_ttl(),
            seed_users: default_seed_users(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/cloudstore.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(CloudStoreError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| CloudStoreError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `CLOUDSTORE_STORAGE_PATH`: blob root directory
    /// - `CLOUDSTORE_DATABASE_PATH`: SQLite database file
    /// - `CLOUDSTORE_PORT`: listen port (ignored if not a valid port)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("CLOUDSTORE_STORAGE_PATH") {
            if !path.is_empty() {
                self.storage.path = path;
            }
        }

        if let Ok(path) = std::env::var("CLOUDSTORE_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }

        if let Ok(port) = std::env::var("CLOUDSTORE_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid CLOUDSTORE_PORT"),
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.auth.token_ttl_hours == 0 {
            return Err(CloudStoreError::Config(
                "auth.token_ttl_hours must be greater than 0".to_string(),
            ));
        }
        if self.auth.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(CloudStoreError::Config(format!(
                "auth.token_ttl_hours must be at most {MAX_TOKEN_TTL_HOURS}"
            )));
        }
        if self.storage.max_upload_size_mb == 0 {
            return Err(CloudStoreError::Config(
                "storage.max_upload_size_mb must be greater than 0".to_string(),
            ));
        }
        if self.storage.max_upload_size_mb > MAX_UPLOAD_SIZE_MB_LIMIT {
            return Err(CloudStoreError::Config(format!(
                "storage.max_upload_size_mb must be at most {MAX_UPLOAD_SIZE_MB_LIMIT}"
            )));
        }
        let base = &self.server.base_path;
        if !base.is_empty() && !base.starts_with('/') {
            return Err(CloudStoreError::Config(format!(
                "server.base_path must start with '/': {base}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.base_path, "/cloud");
        assert!(config.server.cors_origins.is_empty());

        assert_eq!(config.database.path, "data/cloudstore.db");

        assert_eq!(config.storage.path, "./storage");
        assert_eq!(config.storage.max_upload_size_mb, 100);
        assert_eq!(config.storage.max_upload_size_bytes(), 100 * 1024 * 1024);
        assert!(config.storage.cleanup_orphans);

        assert_eq!(config.auth.token_ttl_hours, 24);
        assert_eq!(config.auth.seed_users.len(), 3);
        assert_eq!(
            config.auth.seed_users[0],
            SeedUser::new("user@example.com", "password")
        );

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/cloudstore.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
base_path = ""
cors_origins = ["http://localhost:3000"]

[database]
path = "custom/db.sqlite"

[storage]
path = "/var/lib/cloudstore"
max_upload_size_mb = 5
cleanup_orphans = false

[auth]
token_ttl_hours = 1
seed_users = [{ username = "alice", password = "secret" }]

[logging]
level = "debug"
file = "custom.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.base_path, "");
        assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.database.path, "custom/db.sqlite");
        assert_eq!(config.storage.path, "/var/lib/cloudstore");
        assert_eq!(config.storage.max_upload_size_mb, 5);
        assert!(!config.storage.cleanup_orphans);
        assert_eq!(config.auth.token_ttl_hours, 1);
        assert_eq!(config.auth.seed_users, vec![SeedUser::new("alice", "secret")]);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom.log");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[storage]
max_upload_size_mb = 7
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.storage.max_upload_size_mb, 7);
        assert_eq!(config.storage.path, "./storage");
        assert!(config.storage.cleanup_orphans);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.server.base_path, "/cloud");
        assert_eq!(config.auth.seed_users.len(), 3);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("[server\nport = ");

        if let Err(CloudStoreError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");

        assert!(matches!(result, Err(CloudStoreError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 1234\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.port, 1234);
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml");
        let config = Config::load(path).unwrap();
        let defaults = Config::default();

        assert_eq!(config.server.base_path, defaults.server.base_path);
        assert_eq!(config.server.port, defaults.server.port);
        assert_eq!(config.storage.path, defaults.storage.path);
        assert_eq!(config.auth.seed_users, defaults.auth.seed_users);
        assert_eq!(config.logging.file, defaults.logging.file);
        assert!(config.validate().is_ok());
    }

    // All env var cases live in one test; parallel tests would race on the
    // process environment.
    #[test]
    fn test_apply_env_overrides() {
        let keys = [
            "CLOUDSTORE_STORAGE_PATH",
            "CLOUDSTORE_DATABASE_PATH",
            "CLOUDSTORE_PORT",
        ];
        let originals: Vec<_> = keys.iter().map(|k| std::env::var(k).ok()).collect();

        std::env::set_var("CLOUDSTORE_STORAGE_PATH", "/tmp/blobs");
        std::env::set_var("CLOUDSTORE_DATABASE_PATH", "");
        std::env::set_var("CLOUDSTORE_PORT", "9999");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.storage.path, "/tmp/blobs");
        // Empty value does not override
        assert_eq!(config.database.path, "data/cloudstore.db");
        assert_eq!(config.server.port, 9999);

        std::env::set_var("CLOUDSTORE_PORT", "not-a-port");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.server.port, 8080);

        for (key, original) in keys.iter().zip(originals) {
            match original {
                Some(val) => std::env::set_var(key, val),
                None => std::env::remove_var(key),
            }
        }
    }

    #[test]
    fn test_validate_default() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let mut config = Config::default();
        config.auth.token_ttl_hours = 0;

        let result = config.validate();
        if let Err(CloudStoreError::Config(msg)) = result {
            assert!(msg.contains("token_ttl_hours"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_validate_zero_upload_size() {
        let mut config = Config::default();
        config.storage.max_upload_size_mb = 0;

        assert!(matches!(config.validate(), Err(CloudStoreError::Config(_))));
    }

    #[test]
    fn test_validate_upper_bounds() {
        let mut config = Config::default();
        config.auth.token_ttl_hours = MAX_TOKEN_TTL_HOURS;
        config.storage.max_upload_size_mb = MAX_UPLOAD_SIZE_MB_LIMIT;
        assert!(config.validate().is_ok());

        config.auth.token_ttl_hours = u64::MAX;
        match config.validate() {
            Err(CloudStoreError::Config(msg)) => assert!(msg.contains("token_ttl_hours")),
            other => panic!("Expected Config error, got {other:?}"),
        }

        config.auth.token_ttl_hours = 24;
        config.storage.max_upload_size_mb = u64::MAX;
        match config.validate() {
            Err(CloudStoreError::Config(msg)) => assert!(msg.contains("max_upload_size_mb")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_max_upload_size_bytes_saturates() {
        let storage = StorageConfig {
            max_upload_size_mb: u64::MAX,
            ..StorageConfig::default()
        };

        assert_eq!(storage.max_upload_size_bytes(), u64::MAX);
    }

    #[test]
    fn test_validate_base_path() {
        let mut config = Config::default();
        config.server.base_path = "cloud".to_string();
        assert!(config.validate().is_err());

        config.server.base_path = String::new();
        assert!(config.validate().is_ok());

        config.server.base_path = "/api/v1".to_string();
        assert!(config.validate().is_ok());
    }
}
