//! Carrier webhook message service.
//!
//! Main entry point: initializes logging, loads configuration, fails fast
//! when the webhook secret is missing, opens the database once, and serves
//! HTTP until shutdown.

use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use carrier_api::Config;
use carrier_core::{storage, RealClock, Storage};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting carrier webhook service");

    let config = Config::load()?;
    info!(
        database_url = %config.database_url,
        host = %config.host,
        port = config.port,
        max_connections = config.database_max_connections,
        "Configuration loaded"
    );

    // Startup precondition: without a secret every webhook would be 503.
    if !config.ready() {
        anyhow::bail!("WEBHOOK_SECRET must be set and non-empty");
    }

    let db_pool = create_database_pool(&config).await?;
    info!("Database connection pool established");

    storage::run_migrations(&db_pool).await.context("Failed to run database migrations")?;
    info!("Database migrations completed");

    let storage = Storage::new(db_pool.clone(), Arc::new(RealClock::new()));
    let addr = config.parse_server_addr()?;

    carrier_api::start_server(storage, Arc::new(config), addr)
        .await
        .context("HTTP server failed")?;

    db_pool.close().await;
    info!("Database connections closed");

    info!("Carrier shutdown complete");
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,carrier=debug,tower_http=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer().with_target(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

/// Creates the SQLite connection pool and verifies it answers.
async fn create_database_pool(config: &Config) -> Result<sqlx::SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .context("Invalid DATABASE_URL")?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(config.database_connection_timeout))
        .connect_with(options)
        .await
        .context("Failed to create database connection pool")?;

    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await
        .context("Failed to verify database connection")?;

    Ok(pool)
}
