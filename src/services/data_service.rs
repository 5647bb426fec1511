//! Data Service
//!
//! The batch observation fetch and its two best-effort enrichment tasks.
//! A fetch either replaces the observation set wholesale or leaves it
//! untouched; enrichment never touches observations at all.

use crate::catalog::numeric_vector_id;
use crate::error::{AppError, Result};
use crate::state::{AppState, Observation, SeriesMeta};
use crate::wds::types::{ProductIdRequest, VectorData, VectorIdRequest, VectorLatestN, WdsEnvelope};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Summary returned to the caller of a successful fetch
#[derive(Debug, Serialize)]
pub struct FetchOutcome {
    #[serde(rename = "vectorsRequested")]
    pub vectors_requested: usize,
    #[serde(rename = "observationCount")]
    pub observation_count: usize,
}

pub struct DataService;

impl DataService {
    /// Fetch the latest `period_count` observations for every selected vector.
    ///
    /// Exactly one upstream call is made for the whole batch. Overlapping
    /// invocations are rejected while one is in flight. On success the two
    /// enrichment tasks are spawned fire-and-forget; their completion order
    /// relative to this function returning is not defined.
    pub async fn fetch_observations(
        state: &Arc<AppState>,
        period_count: Option<u32>,
    ) -> Result<FetchOutcome> {
        let periods = period_count.unwrap_or(state.config.default_periods);
        if periods == 0 {
            return Err(AppError::Validation(
                "Period count must be a positive integer".to_string(),
            ));
        }

        let selection = state.selected_vectors();
        if selection.is_empty() {
            return Err(AppError::Validation(
                "Select at least one vector before fetching".to_string(),
            ));
        }

        let _guard = state.begin_fetch()?;
        let generation = state.next_fetch_generation();

        let batch: Vec<VectorLatestN> = selection
            .iter()
            .map(|series| {
                Ok(VectorLatestN {
                    vector_id: numeric_vector_id(&series.vector_id)?,
                    latest_n: periods,
                })
            })
            .collect::<Result<_>>()?;

        info!(
            "Fetching latest {} periods for {} vectors",
            periods,
            batch.len()
        );

        let response = state.wds.vector_data_latest(&batch).await?;
        let observations = flatten_observations(&response);
        let observation_count = observations.len();
        state.replace_observations(observations);

        info!("Fetch complete: {} observations", observation_count);

        // Fire-and-forget enrichment. Failures degrade to fallback labels and
        // never affect the observations already stored.
        let fetched_ids: Vec<i64> = response
            .iter()
            .filter_map(|item| item.success())
            .map(|data| data.vector_id)
            .collect();
        let series_state = Arc::clone(state);
        tokio::spawn(async move {
            Self::refresh_series_metadata(&series_state, generation, fetched_ids).await;
        });

        if let Some(first) = selection.first() {
            let cube_state = Arc::clone(state);
            let product_id = first.product_id.clone();
            tokio::spawn(async move {
                Self::refresh_cube_metadata(&cube_state, generation, product_id).await;
            });
        }

        Ok(FetchOutcome {
            vectors_requested: batch.len(),
            observation_count,
        })
    }

    /// Rebuild series metadata for the given vector ids, falling back to the
    /// selection labels when the lookup fails or yields nothing.
    ///
    /// Mutates nothing once `generation` is no longer the current fetch: a
    /// slow lookup spawned by an earlier fetch must not clobber the metadata
    /// belonging to a newer one.
    pub async fn refresh_series_metadata(
        state: &Arc<AppState>,
        generation: u64,
        vector_ids: Vec<i64>,
    ) {
        if vector_ids.is_empty() {
            debug!("No vector ids in fetched data, skipping series info lookup");
            if state.is_current_fetch(generation) {
                state.clear_series_metadata();
            }
            return;
        }

        let request: Vec<VectorIdRequest> = vector_ids
            .iter()
            .map(|id| VectorIdRequest {
                vector_id: id.to_string(),
            })
            .collect();

        let result = state.wds.series_info(&request).await;

        if !state.is_current_fetch(generation) {
            debug!("Discarding series info from superseded fetch {}", generation);
            return;
        }

        state.clear_series_metadata();
        match result {
            Ok(items) => {
                for info in items.iter().filter_map(|item| item.success()) {
                    if let Some(name) = &info.series_name_en {
                        state.insert_series_metadata(
                            info.vector_id,
                            SeriesMeta {
                                title: name.clone(),
                                description: name.clone(),
                            },
                        );
                    }
                }
                if state.series_metadata_len() == 0 {
                    debug!("Series info response had no usable entries, using selection labels");
                    Self::apply_label_fallback(state);
                }
            }
            Err(e) => {
                warn!("Series info lookup failed, using selection labels: {}", e);
                Self::apply_label_fallback(state);
            }
        }
    }

    /// Fetch cube metadata for one product. Best effort; the previous value
    /// is kept when the lookup fails, and the result is discarded when a
    /// newer fetch has superseded `generation`.
    pub async fn refresh_cube_metadata(state: &Arc<AppState>, generation: u64, product_id: String) {
        let request = vec![ProductIdRequest {
            product_id: product_id.clone(),
        }];

        let result = state.wds.cube_metadata(&request).await;

        if !state.is_current_fetch(generation) {
            debug!("Discarding cube metadata from superseded fetch {}", generation);
            return;
        }

        match result {
            Ok(items) => match items.iter().find_map(|item| item.success()) {
                Some(metadata) => {
                    debug!("Cube metadata received for product {}", product_id);
                    state.set_cube_metadata(Some(metadata.clone()));
                }
                None => debug!("Cube metadata response had no SUCCESS entry"),
            },
            Err(e) => warn!("Cube metadata lookup failed for {}: {}", product_id, e),
        }
    }

    fn apply_label_fallback(state: &Arc<AppState>) {
        for series in state.selected_vectors() {
            if let Ok(id) = numeric_vector_id(&series.vector_id) {
                state.insert_series_metadata(
                    id,
                    SeriesMeta {
                        title: series.label.clone(),
                        description: series.label,
                    },
                );
            }
        }
    }
}

/// Flatten per-vector envelopes into the observation list, skipping failed
/// items and preserving upstream order.
fn flatten_observations(response: &[WdsEnvelope<VectorData>]) -> Vec<Observation> {
    response
        .iter()
        .filter_map(|item| item.success())
        .flat_map(|data| {
            data.vector_data_point.iter().map(|point| Observation {
                vector_id: data.vector_id,
                date: point.ref_per.clone(),
                value: point.value,
            })
        })
        .collect()
}
