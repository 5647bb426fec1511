//! Export Service
//!
//! Serializes the current session (selection, metadata, observations) into a
//! dated JSON snapshot on disk.

use crate::error::{AppError, Result};
use crate::state::{AppState, Observation, SeriesMeta, SeriesRef};
use crate::wds::types::CubeMetadata;
use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    #[serde(rename = "exportDate")]
    pub export_date: String,
    #[serde(rename = "selectedVectors")]
    pub selected_vectors: Vec<SeriesRef>,
    #[serde(rename = "cubeMetadata")]
    pub cube_metadata: Option<CubeMetadata>,
    #[serde(rename = "seriesInfo")]
    pub series_info: IndexMap<i64, SeriesMeta>,
}

/// The exported artifact
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: SnapshotMetadata,
    pub data: Vec<Observation>,
}

/// Snapshot plus where it was written
#[derive(Debug, Serialize)]
pub struct ExportResult {
    pub path: PathBuf,
    pub snapshot: Snapshot,
}

pub struct ExportService;

impl ExportService {
    /// Bundle the current session state. Fails when there is nothing to export.
    pub fn build_snapshot(state: &AppState) -> Result<Snapshot> {
        let data = state.observations();
        if data.is_empty() {
            return Err(AppError::Validation("No data to export".to_string()));
        }

        Ok(Snapshot {
            metadata: SnapshotMetadata {
                export_date: Utc::now().to_rfc3339(),
                selected_vectors: state.selected_vectors(),
                cube_metadata: state.cube_metadata(),
                series_info: state.series_metadata_snapshot(),
            },
            data,
        })
    }

    /// Write the snapshot to `{export_dir}/statcan-data-{YYYY-MM-DD}.json`
    pub fn export_snapshot(state: &AppState) -> Result<ExportResult> {
        let snapshot = Self::build_snapshot(state)?;

        let filename = format!("statcan-data-{}.json", Utc::now().format("%Y-%m-%d"));
        let path = state.config.export_dir.join(filename);
        fs::write(&path, serde_json::to_vec_pretty(&snapshot)?)?;

        info!(
            "Exported {} observations to {}",
            snapshot.data.len(),
            path.display()
        );

        Ok(ExportResult { path, snapshot })
    }
}
