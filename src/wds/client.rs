//! HTTP client for the WDS endpoints
//!
//! Each operation posts a JSON array to one fixed endpoint and gets an array
//! of `{ status, object }` envelopes back. The trait seam exists so services
//! can be exercised against a mock upstream in tests.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::wds::types::*;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

const VECTOR_DATA_OP: &str = "getDataFromVectorsAndLatestNPeriods";
const SERIES_INFO_OP: &str = "getSeriesInfoFromVector";
const CUBE_METADATA_OP: &str = "getCubeMetadata";

/// Upstream operations the explorer needs
#[async_trait]
pub trait WdsApi: Send + Sync {
    /// Latest-N observations for a batch of vectors. Exactly one HTTP call.
    async fn vector_data_latest(
        &self,
        request: &[VectorLatestN],
    ) -> Result<Vec<WdsEnvelope<VectorData>>>;

    /// Descriptive metadata for a batch of vectors
    async fn series_info(
        &self,
        request: &[VectorIdRequest],
    ) -> Result<Vec<WdsEnvelope<SeriesInfo>>>;

    /// Cube metadata for a batch of products
    async fn cube_metadata(
        &self,
        request: &[ProductIdRequest],
    ) -> Result<Vec<WdsEnvelope<CubeMetadata>>>;
}

/// reqwest-backed WDS client
pub struct WdsClient {
    client: Client,
    vector_data_url: Url,
    series_info_url: Url,
    cube_metadata_url: Url,
}

impl WdsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            vector_data_url: config.wds_endpoint(VECTOR_DATA_OP)?,
            series_info_url: config.wds_endpoint(SERIES_INFO_OP)?,
            cube_metadata_url: config.wds_endpoint(CUBE_METADATA_OP)?,
        })
    }

    async fn post_json<Req, Res>(&self, url: &Url, request: &Req) -> Result<Res>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let response = self
            .client
            .post(url.clone())
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl WdsApi for WdsClient {
    async fn vector_data_latest(
        &self,
        request: &[VectorLatestN],
    ) -> Result<Vec<WdsEnvelope<VectorData>>> {
        self.post_json(&self.vector_data_url, request).await
    }

    async fn series_info(
        &self,
        request: &[VectorIdRequest],
    ) -> Result<Vec<WdsEnvelope<SeriesInfo>>> {
        self.post_json(&self.series_info_url, request).await
    }

    async fn cube_metadata(
        &self,
        request: &[ProductIdRequest],
    ) -> Result<Vec<WdsEnvelope<CubeMetadata>>> {
        self.post_json(&self.cube_metadata_url, request).await
    }
}
