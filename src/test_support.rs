//! Shared fixtures for unit tests

use crate::catalog::{Catalog, Product, VectorEntry};
use crate::config::{Config, DEFAULT_WDS_BASE};
use crate::error::{AppError, Result};
use crate::state::{AppState, SeriesRef};
use crate::wds::types::*;
use crate::wds::WdsApi;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

/// Scripted upstream. A `None` response simulates an upstream 503.
#[derive(Default)]
pub struct MockWds {
    pub data_response: Mutex<Option<Vec<WdsEnvelope<VectorData>>>>,
    pub series_response: Mutex<Option<Vec<WdsEnvelope<SeriesInfo>>>>,
    pub cube_response: Mutex<Option<Vec<WdsEnvelope<CubeMetadata>>>>,
    pub data_calls: AtomicUsize,
    pub series_calls: AtomicUsize,
    pub cube_calls: AtomicUsize,
    pub last_data_request: Mutex<Option<Vec<VectorLatestN>>>,
}

impl MockWds {
    pub fn with_data(points: Vec<WdsEnvelope<VectorData>>) -> Arc<Self> {
        let mock = Self::default();
        *mock.data_response.lock() = Some(points);
        Arc::new(mock)
    }

    fn unavailable() -> AppError {
        AppError::Upstream {
            status: 503,
            reason: "Service Unavailable".to_string(),
        }
    }
}

#[async_trait]
impl WdsApi for MockWds {
    async fn vector_data_latest(
        &self,
        request: &[VectorLatestN],
    ) -> Result<Vec<WdsEnvelope<VectorData>>> {
        self.data_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_data_request.lock() = Some(request.to_vec());
        self.data_response
            .lock()
            .clone()
            .ok_or_else(Self::unavailable)
    }

    async fn series_info(
        &self,
        _request: &[VectorIdRequest],
    ) -> Result<Vec<WdsEnvelope<SeriesInfo>>> {
        self.series_calls.fetch_add(1, Ordering::SeqCst);
        self.series_response
            .lock()
            .clone()
            .ok_or_else(Self::unavailable)
    }

    async fn cube_metadata(
        &self,
        _request: &[ProductIdRequest],
    ) -> Result<Vec<WdsEnvelope<CubeMetadata>>> {
        self.cube_calls.fetch_add(1, Ordering::SeqCst);
        self.cube_response
            .lock()
            .clone()
            .ok_or_else(Self::unavailable)
    }
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        wds_base_url: Url::parse(DEFAULT_WDS_BASE).expect("valid base url"),
        catalog_path: "data/catalog.json".into(),
        export_dir: std::env::temp_dir(),
        default_periods: 12,
        http_timeout_secs: 30,
    }
}

pub fn test_catalog() -> Catalog {
    Catalog::from_products(vec![
        Product {
            product_id: "36100434".to_string(),
            description: "GDP at basic prices, by industry".to_string(),
            vectors: vec![VectorEntry {
                vector_id: "v41690973".to_string(),
                text: "GDP".to_string(),
            }],
        },
        Product {
            product_id: "18100004".to_string(),
            description: "Consumer Price Index, monthly".to_string(),
            vectors: vec![
                VectorEntry {
                    vector_id: "v41690914".to_string(),
                    text: "All-items".to_string(),
                },
                VectorEntry {
                    vector_id: "v41691048".to_string(),
                    text: "Energy".to_string(),
                },
            ],
        },
    ])
}

pub fn series_ref(vector_id: &str, product_id: &str, label: &str) -> SeriesRef {
    SeriesRef {
        vector_id: vector_id.to_string(),
        product_id: product_id.to_string(),
        label: label.to_string(),
    }
}

pub fn envelope(vector_id: i64, points: &[(&str, f64)]) -> WdsEnvelope<VectorData> {
    WdsEnvelope {
        status: STATUS_SUCCESS.to_string(),
        object: Some(VectorData {
            vector_id,
            vector_data_point: points
                .iter()
                .map(|(date, value)| VectorDataPoint {
                    ref_per: date.to_string(),
                    value: *value,
                })
                .collect(),
        }),
    }
}

pub fn mock_state() -> Arc<AppState> {
    mock_state_with(Arc::new(MockWds::default()))
}

pub fn mock_state_with(mock: Arc<MockWds>) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(), test_catalog(), mock))
}
