//! Tally API Server
//!
//! Main entry point for the Tally ledger and inventory service.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_api::{AppState, create_router};
use tally_core::inventory::StockLevelCache;
use tally_db::connect_with;
use tally_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    // Connect to database (and migrate if configured)
    let db = connect_with(&config.database).await?;
    info!(run_migrations = config.database.run_migrations, "Connected to database");

    let stock_cache = config.stock_cache.enabled.then(|| {
        info!(
            max_capacity = config.stock_cache.max_capacity,
            ttl_secs = config.stock_cache.ttl_secs,
            "Stock level cache enabled"
        );
        StockLevelCache::with_config(config.stock_cache.max_capacity, config.stock_cache.ttl_secs)
    });

    let app = create_router(AppState::new(db, stock_cache));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
