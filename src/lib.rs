//! StatCan Data Explorer
//!
//! A local service for browsing Statistics Canada data vectors: maintain a
//! selection from a static product catalog, fetch the latest N observations
//! per vector from the WDS, derive chart/table output, and export snapshots.
//! Also serves stateless proxy routes so a browser frontend can reach the WDS
//! despite cross-origin restrictions.

pub mod catalog;
pub mod config;
pub mod error;
pub mod server;
pub mod services;
pub mod state;
pub mod wds;

#[cfg(test)]
pub(crate) mod test_support;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::server::ApiServer;
use crate::state::AppState;
use crate::wds::WdsClient;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging, build the state, and serve until interrupted
pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statcan_explorer=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting StatCan Explorer...");

    let config = Config::load()?;
    let catalog = Catalog::load(&config.catalog_path)?;
    let wds = Arc::new(WdsClient::new(&config)?);
    let state = Arc::new(AppState::new(config, catalog, wds));

    let mut server = ApiServer::new(state);
    server.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    server.stop();

    Ok(())
}
