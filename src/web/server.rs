//! Web server for Cloudstore.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::file::BlobStore;
use crate::{CloudStoreError, Database, Result};

use super::handlers::AppState;
use super::router::create_router;

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Full configuration (server section used for routing).
    config: Config,
}

impl WebServer {
    /// Create a new web server.
    ///
    /// Rejects a configuration that fails [`Config::validate`].
    pub fn new(config: &Config, db: Database, storage: BlobStore) -> Result<Self> {
        config.validate()?;

        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| {
                CloudStoreError::Config(format!(
                    "invalid server address {}:{}: {}",
                    config.server.host, config.server.port, e
                ))
            })?;

        let app_state = AppState::new(db, storage)
            // Bounded by validate.
            .with_token_ttl(chrono::Duration::hours(config.auth.token_ttl_hours as i64))
            .with_max_upload_size(config.storage.max_upload_size_bytes())
            .with_cleanup_orphans(config.storage.cleanup_orphans);

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            config: config.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run the web server.
    pub async fn run(self) -> Result<()> {
        let router = create_router(self.app_state, &self.config.server);

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(
            "Web server listening on http://{}{}",
            local_addr,
            self.config.server.base_path
        );

        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let router = create_router(self.app_state, &self.config.server);

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::open_in_memory().await.unwrap();
        let storage = BlobStore::new(dir.path()).unwrap();

        let server = WebServer::new(&create_test_config(), db, storage).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_web_server_rejects_bad_host() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::open_in_memory().await.unwrap();
        let storage = BlobStore::new(dir.path()).unwrap();

        let mut config = create_test_config();
        config.server.host = "not a host".to_string();
        let result = WebServer::new(&config, db, storage);
        assert!(matches!(result, Err(CloudStoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_rejects_oversized_ttl() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::open_in_memory().await.unwrap();
        let storage = BlobStore::new(dir.path()).unwrap();

        let mut config = create_test_config();
        config.auth.token_ttl_hours = u64::MAX;
        let result = WebServer::new(&config, db, storage);
        assert!(matches!(result, Err(CloudStoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::open_in_memory().await.unwrap();
        let storage = BlobStore::new(dir.path()).unwrap();

        let server = WebServer::new(&create_test_config(), db, storage).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("OK"));
    }
}
