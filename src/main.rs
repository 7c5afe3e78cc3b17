use tracing::{error, info};

use cloudstore::{BlobStore, Config, CredentialStore, Database, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let mut config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = cloudstore::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        cloudstore::logging::init_console_only(&config.logging.level);
    }

    info!("Cloudstore - per-user cloud file storage");

    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> cloudstore::Result<()> {
    let db = Database::open(&config.database.path).await?;

    let created = CredentialStore::new(db.pool())
        .seed_default_accounts(&config.auth.seed_users)
        .await?;
    info!(created, "Default accounts seeded");

    let storage = BlobStore::new(&config.storage.path)?;
    info!("Blob storage at {}", config.storage.path);

    WebServer::new(&config, db, storage)?.run().await
}
