//! Selection Service
//!
//! Toggle/remove/clear operations on the selection set. Vectors are resolved
//! from the catalog by id, never from anything a client rendered.

use crate::error::{AppError, Result};
use crate::state::{AppState, SeriesRef};
use serde::Serialize;
use tracing::debug;

/// Result of a toggle or remove
#[derive(Debug, Serialize)]
pub struct SelectionUpdate {
    #[serde(rename = "vectorId")]
    pub vector_id: String,
    pub selected: bool,
    pub count: usize,
}

/// Current selection
#[derive(Debug, Serialize)]
pub struct SelectionView {
    pub count: usize,
    pub vectors: Vec<SeriesRef>,
}

pub struct SelectionService;

impl SelectionService {
    /// Toggle one vector: insert if absent, remove if present
    pub fn toggle(state: &AppState, vector_id: &str) -> Result<SelectionUpdate> {
        let (product, vector) = state
            .catalog
            .find_vector(vector_id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown vector: {}", vector_id)))?;

        let series = SeriesRef {
            vector_id: vector.vector_id.clone(),
            product_id: product.product_id.clone(),
            label: vector.text.clone(),
        };

        let selected = state.toggle_selection(series);
        debug!(
            "{} vector {} ({} selected)",
            if selected { "Added" } else { "Removed" },
            vector_id,
            state.selection_len()
        );

        Ok(SelectionUpdate {
            vector_id: vector_id.to_string(),
            selected,
            count: state.selection_len(),
        })
    }

    /// Remove one vector from the selection
    pub fn remove(state: &AppState, vector_id: &str) -> SelectionUpdate {
        let removed = state.remove_selection(vector_id);
        if removed {
            debug!("Removed vector {}", vector_id);
        }
        SelectionUpdate {
            vector_id: vector_id.to_string(),
            selected: false,
            count: state.selection_len(),
        }
    }

    pub fn clear(state: &AppState) -> SelectionView {
        state.clear_selection();
        Self::list(state)
    }

    pub fn list(state: &AppState) -> SelectionView {
        let vectors = state.selected_vectors();
        SelectionView {
            count: vectors.len(),
            vectors,
        }
    }
}
