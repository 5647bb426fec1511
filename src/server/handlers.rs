//! Explorer REST API handlers
//!
//! Thin adapters from HTTP to the service layer. Every handler returns either
//! a JSON payload or an `AppError`, which renders as the shared error
//! envelope with the matching status code.

use crate::catalog::Product;
use crate::error::{AppError, Result};
use crate::services::{ChartService, DataService, ExportService, SelectionService};
use crate::state::{AppState, Observation, VisualizationMode};
use crate::services::chart_service::{ChartRow, ChartView};
use crate::services::data_service::FetchOutcome;
use crate::services::export_service::ExportResult;
use crate::services::selection_service::{SelectionUpdate, SelectionView};
use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    #[serde(rename = "vectorId")]
    pub vector_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct FetchRequest {
    pub periods: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: VisualizationMode,
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "statcan-explorer" }))
}

// ============================================================================
// Catalog
// ============================================================================

/// GET /api/catalog
pub async fn list_catalog(State(state): State<Arc<AppState>>) -> Json<Vec<Product>> {
    Json(state.catalog.products().to_vec())
}

/// GET /api/catalog/{product_id}
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>> {
    state
        .catalog
        .get_product(&product_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Unknown product: {}", product_id)))
}

// ============================================================================
// Selection
// ============================================================================

/// POST /api/selection/toggle
pub async fn toggle_selection(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<SelectionUpdate>> {
    SelectionService::toggle(&state, &request.vector_id).map(Json)
}

/// DELETE /api/selection/{vector_id}
pub async fn remove_selection(
    State(state): State<Arc<AppState>>,
    Path(vector_id): Path<String>,
) -> Json<SelectionUpdate> {
    Json(SelectionService::remove(&state, &vector_id))
}

/// GET /api/selection
pub async fn get_selection(State(state): State<Arc<AppState>>) -> Json<SelectionView> {
    Json(SelectionService::list(&state))
}

/// DELETE /api/selection
pub async fn clear_selection(State(state): State<Arc<AppState>>) -> Json<SelectionView> {
    Json(SelectionService::clear(&state))
}

// ============================================================================
// Data
// ============================================================================

/// POST /api/fetch
pub async fn fetch_observations(
    State(state): State<Arc<AppState>>,
    request: Option<Json<FetchRequest>>,
) -> Result<Json<FetchOutcome>> {
    let periods = request.and_then(|Json(r)| r.periods);
    DataService::fetch_observations(&state, periods)
        .await
        .map(Json)
}

/// GET /api/observations
pub async fn list_observations(State(state): State<Arc<AppState>>) -> Json<Vec<Observation>> {
    Json(state.observations())
}

// ============================================================================
// Visualization
// ============================================================================

/// POST /api/visualization
pub async fn set_visualization_mode(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ModeRequest>,
) -> Json<ChartView> {
    Json(ChartService::set_mode(&state, request.mode))
}

/// GET /api/visualization
pub async fn get_chart(State(state): State<Arc<AppState>>) -> Json<ChartView> {
    Json(ChartService::current_view(&state))
}

/// GET /api/table
pub async fn table_view(State(state): State<Arc<AppState>>) -> Json<Vec<ChartRow>> {
    Json(ChartService::table_rows(&state))
}

// ============================================================================
// Export
// ============================================================================

/// POST /api/export
pub async fn export_snapshot(State(state): State<Arc<AppState>>) -> Result<Json<ExportResult>> {
    ExportService::export_snapshot(&state).map(Json)
}
