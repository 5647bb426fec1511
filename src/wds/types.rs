//! WDS request and response types
//!
//! The WDS wraps every per-item result in a `{ status, object }` envelope and
//! is loose about numeric types (vector ids and values arrive as numbers or
//! strings depending on the endpoint), so the id/value fields use flexible
//! deserializers.

use serde::{Deserialize, Deserializer, Serialize};

/// Envelope status the WDS uses for a successful per-item result
pub const STATUS_SUCCESS: &str = "SUCCESS";

/// Deserialize a vector id that may arrive as a number or a string
fn deserialize_flexible_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlexibleInt {
        Int(i64),
        Str(String),
    }

    match FlexibleInt::deserialize(deserializer)? {
        FlexibleInt::Int(i) => Ok(i),
        FlexibleInt::Str(s) => s
            .trim_start_matches('v')
            .parse()
            .map_err(serde::de::Error::custom),
    }
}

/// Deserialize an observation value that may arrive as a number or a string
fn deserialize_flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlexibleFloat {
        Float(f64),
        Int(i64),
        Str(String),
    }

    match FlexibleFloat::deserialize(deserializer)? {
        FlexibleFloat::Float(f) => Ok(f),
        FlexibleFloat::Int(i) => Ok(i as f64),
        FlexibleFloat::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

// ============================================================================
// Requests
// ============================================================================

/// One entry of the batched observation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorLatestN {
    #[serde(rename = "vectorId")]
    pub vector_id: i64,
    #[serde(rename = "latestN")]
    pub latest_n: u32,
}

/// Series-info lookup entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIdRequest {
    #[serde(rename = "vectorId")]
    pub vector_id: String,
}

/// Cube-metadata lookup entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductIdRequest {
    #[serde(rename = "productId")]
    pub product_id: String,
}

// ============================================================================
// Responses
// ============================================================================

/// Per-item response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WdsEnvelope<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<T>,
}

impl<T> WdsEnvelope<T> {
    /// The payload, if this item succeeded
    pub fn success(&self) -> Option<&T> {
        (self.status == STATUS_SUCCESS)
            .then_some(self.object.as_ref())
            .flatten()
    }
}

/// One raw data point for a vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDataPoint {
    #[serde(rename = "refPer")]
    pub ref_per: String,
    #[serde(deserialize_with = "deserialize_flexible_f64")]
    pub value: f64,
}

/// Observations for one vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorData {
    #[serde(rename = "vectorId", deserialize_with = "deserialize_flexible_i64")]
    pub vector_id: i64,
    #[serde(rename = "vectorDataPoint", default)]
    pub vector_data_point: Vec<VectorDataPoint>,
}

/// Series descriptive metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesInfo {
    #[serde(rename = "vectorId", deserialize_with = "deserialize_flexible_i64")]
    pub vector_id: i64,
    #[serde(rename = "SeriesNameEn")]
    pub series_name_en: Option<String>,
}

/// Cube (product) descriptive metadata
///
/// Only the English title is used directly; the rest of the object is kept
/// verbatim so exports carry the full upstream metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeMetadata {
    #[serde(rename = "cubeTitleEn")]
    pub cube_title_en: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
