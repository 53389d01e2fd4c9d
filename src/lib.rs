//! Country Exchange - country metadata and currency rate aggregation
//!
//! Pulls the country directory and the USD exchange-rate table from two
//! upstream sources, stores a joined and enriched copy in SQLite and serves
//! it over a JSON REST API together with a rendered summary card.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod sources;
pub mod state;
pub mod summary;

use api::ApiServer;
use config::AppConfig;
use error::Result;
use state::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging, `RUST_LOG` overrides the default filter
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "country_exchange=debug,country_exchange_lib=debug,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the service until Ctrl-C
pub async fn run(config: AppConfig) -> Result<()> {
    tracing::info!("Starting Country Exchange...");

    let state = Arc::new(AppState::new(&config)?);
    tracing::info!("Application state initialized");

    let cors = api::cors_layer(&config.cors_origins)?;
    let mut server = ApiServer::new(state, cors);
    server.start(config.listen_addr).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }

    tracing::info!("Shutdown signal received");
    server.shutdown().await;

    Ok(())
}
