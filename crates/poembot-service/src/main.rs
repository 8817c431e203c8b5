//! Poembot Service - random poems over HTTP.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use poembot_service::{create_router, AppState, ServiceConfig};
use poembot_store::{PoemsTable, RocksStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,poembot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Poembot Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        secondary_dir = ?config.secondary_dir,
        read_range = ?config.read_range,
        "Service configuration loaded"
    );

    // Follow the generator's database when a secondary directory is given
    let store = match &config.secondary_dir {
        Some(secondary) => {
            tracing::info!(path = %config.data_dir, secondary = %secondary, "Opening RocksDB store as secondary");
            RocksStore::open_secondary(&config.data_dir, secondary)?
        }
        None => {
            tracing::info!(path = %config.data_dir, "Opening RocksDB store");
            RocksStore::open(&config.data_dir)?
        }
    };
    let poems = PoemsTable::new(Arc::new(store));

    let state = AppState::new(poems, config.clone());
    let app = create_router(state);

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
