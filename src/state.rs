//! Application state management
//!
//! One `AppState` is built by the composition root and shared behind an `Arc`.
//! Selection order is significant (cube-metadata enrichment targets the first
//! selected vector, and the bar-chart tie-break follows original order), so
//! the selection lives in an `IndexMap`. Vector ids are canonicalized to their
//! numeric form everywhere downstream of the catalog; only the catalog and the
//! selection keys keep the `v`-prefixed string form.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::wds::types::CubeMetadata;
use crate::wds::WdsApi;
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// One selected series, built from a catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesRef {
    #[serde(rename = "vectorId")]
    pub vector_id: String,
    #[serde(rename = "productId")]
    pub product_id: String,
    pub label: String,
}

/// One flattened data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "vectorId")]
    pub vector_id: i64,
    pub date: String,
    pub value: f64,
}

/// Display metadata for one series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesMeta {
    pub title: String,
    pub description: String,
}

/// How fetched observations are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    #[default]
    Line,
    Scatter,
    Bar,
}

/// Application state shared across all handlers
pub struct AppState {
    /// Runtime configuration
    pub config: Config,

    /// Static product catalog
    pub catalog: Catalog,

    /// Upstream WDS client
    pub wds: Arc<dyn WdsApi>,

    /// Selected vectors, in selection order
    selection: RwLock<IndexMap<String, SeriesRef>>,

    /// Observations from the most recent successful fetch
    observations: RwLock<Vec<Observation>>,

    /// Display metadata keyed by numeric vector id; written by enrichment tasks
    series_metadata: DashMap<i64, SeriesMeta>,

    /// Cube metadata for the first selected vector's product
    cube_metadata: RwLock<Option<CubeMetadata>>,

    /// Current visualization mode
    visualization: RwLock<VisualizationMode>,

    /// Set while a batch fetch is running
    fetch_in_flight: AtomicBool,

    /// Monotonic id of the most recent fetch. Enrichment tasks outlive the
    /// fetch that spawned them, so they carry this id and discard their
    /// results once a newer fetch has superseded them.
    fetch_generation: AtomicU64,
}

/// Releases the in-flight flag when the fetch ends, on every exit path
pub struct FetchGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl AppState {
    pub fn new(config: Config, catalog: Catalog, wds: Arc<dyn WdsApi>) -> Self {
        Self {
            config,
            catalog,
            wds,
            selection: RwLock::new(IndexMap::new()),
            observations: RwLock::new(Vec::new()),
            series_metadata: DashMap::new(),
            cube_metadata: RwLock::new(None),
            visualization: RwLock::new(VisualizationMode::default()),
            fetch_in_flight: AtomicBool::new(false),
            fetch_generation: AtomicU64::new(0),
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Insert if absent, remove if present. Returns true if now selected.
    pub fn toggle_selection(&self, series: SeriesRef) -> bool {
        let mut selection = self.selection.write();
        if selection.shift_remove(&series.vector_id).is_some() {
            false
        } else {
            selection.insert(series.vector_id.clone(), series);
            true
        }
    }

    /// Remove one vector. Returns true if it was selected.
    pub fn remove_selection(&self, vector_id: &str) -> bool {
        self.selection.write().shift_remove(vector_id).is_some()
    }

    pub fn clear_selection(&self) {
        self.selection.write().clear();
    }

    pub fn selection_len(&self) -> usize {
        self.selection.read().len()
    }

    pub fn is_selected(&self, vector_id: &str) -> bool {
        self.selection.read().contains_key(vector_id)
    }

    /// Snapshot of the selection in selection order
    pub fn selected_vectors(&self) -> Vec<SeriesRef> {
        self.selection.read().values().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Observations
    // ------------------------------------------------------------------

    pub fn observations(&self) -> Vec<Observation> {
        self.observations.read().clone()
    }

    pub fn has_observations(&self) -> bool {
        !self.observations.read().is_empty()
    }

    /// Replace the observation set wholesale
    pub fn replace_observations(&self, observations: Vec<Observation>) {
        *self.observations.write() = observations;
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    pub fn series_title(&self, vector_id: i64) -> Option<String> {
        self.series_metadata.get(&vector_id).map(|m| m.title.clone())
    }

    pub fn series_metadata_snapshot(&self) -> IndexMap<i64, SeriesMeta> {
        let mut snapshot: IndexMap<i64, SeriesMeta> = self
            .series_metadata
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        snapshot.sort_keys();
        snapshot
    }

    pub fn clear_series_metadata(&self) {
        self.series_metadata.clear();
    }

    pub fn insert_series_metadata(&self, vector_id: i64, meta: SeriesMeta) {
        self.series_metadata.insert(vector_id, meta);
    }

    pub fn series_metadata_len(&self) -> usize {
        self.series_metadata.len()
    }

    pub fn cube_metadata(&self) -> Option<CubeMetadata> {
        self.cube_metadata.read().clone()
    }

    pub fn set_cube_metadata(&self, metadata: Option<CubeMetadata>) {
        *self.cube_metadata.write() = metadata;
    }

    // ------------------------------------------------------------------
    // Visualization
    // ------------------------------------------------------------------

    pub fn visualization_mode(&self) -> VisualizationMode {
        *self.visualization.read()
    }

    pub fn set_visualization_mode(&self, mode: VisualizationMode) {
        *self.visualization.write() = mode;
    }

    // ------------------------------------------------------------------
    // Fetch coordination
    // ------------------------------------------------------------------

    /// Claim the in-flight flag; overlapping fetches are rejected.
    pub fn begin_fetch(&self) -> Result<FetchGuard<'_>> {
        if self.fetch_in_flight.swap(true, Ordering::SeqCst) {
            return Err(AppError::FetchInFlight);
        }
        Ok(FetchGuard {
            flag: &self.fetch_in_flight,
        })
    }

    /// Advance to a new fetch generation and return its id
    pub fn next_fetch_generation(&self) -> u64 {
        self.fetch_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether the given generation is still the most recent fetch
    pub fn is_current_fetch(&self, generation: u64) -> bool {
        self.fetch_generation.load(Ordering::SeqCst) == generation
    }
}
