//! HTTP server for the explorer API and the WDS proxy
//!
//! Provides:
//! - Explorer REST API (/api/*): catalog, selection, fetch, chart, export
//! - WDS proxy routes (/proxy/*) for browser clients blocked by CORS

pub mod handlers;
pub mod proxy;

use crate::error::Result;
use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the full router: explorer API plus proxy routes, with permissive
/// CORS and request tracing.
pub fn build_router(state: Arc<AppState>) -> Result<Router> {
    let proxy_state = Arc::new(proxy::ProxyState::new(&state.config)?);

    let api = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/", get(handlers::health_check))
        // Catalog
        .route("/api/catalog", get(handlers::list_catalog))
        .route("/api/catalog/:product_id", get(handlers::get_product))
        // Selection
        .route(
            "/api/selection",
            get(handlers::get_selection).delete(handlers::clear_selection),
        )
        .route("/api/selection/toggle", post(handlers::toggle_selection))
        .route("/api/selection/:vector_id", delete(handlers::remove_selection))
        // Data
        .route("/api/fetch", post(handlers::fetch_observations))
        .route("/api/observations", get(handlers::list_observations))
        // Visualization
        .route(
            "/api/visualization",
            get(handlers::get_chart).post(handlers::set_visualization_mode),
        )
        .route("/api/table", get(handlers::table_view))
        // Export
        .route("/api/export", post(handlers::export_snapshot))
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(api
        .merge(proxy::proxy_router(proxy_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// API server manager
pub struct ApiServer {
    state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            shutdown_tx: None,
        }
    }

    /// Bind and start serving in a background task
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let config = &self.state.config;
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| crate::error::AppError::Config(format!("Invalid address: {}", e)))?;

        let app = build_router(Arc::clone(&self.state))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            });

            if let Err(e) = server.await {
                error!("API server error: {}", e);
            }
        });

        info!("StatCan Explorer API listening on {}", local_addr);
        info!("  GET  http://{}/api/catalog", local_addr);
        info!("  POST http://{}/api/selection/toggle", local_addr);
        info!("  POST http://{}/api/fetch", local_addr);
        info!("  POST http://{}/proxy/vector-data", local_addr);
        info!("  POST http://{}/proxy/series-info", local_addr);
        info!("  POST http://{}/proxy/cube-metadata", local_addr);

        Ok(local_addr)
    }

    /// Stop the server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("API server stop signal sent");
        }
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}
