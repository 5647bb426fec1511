//! Environment-driven configuration

use crate::error::{AppError, Result};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;
use url::Url;

/// Default base URL of the Statistics Canada Web Data Service.
pub const DEFAULT_WDS_BASE: &str = "https://www150.statcan.gc.ca/t1/wds/rest";

/// Runtime configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the API server binds to
    pub host: String,
    pub port: u16,

    /// Base URL of the upstream WDS API
    pub wds_base_url: Url,

    /// Path to the static product catalog
    pub catalog_path: PathBuf,

    /// Directory snapshot exports are written to
    pub export_dir: PathBuf,

    /// Periods requested per vector when the client does not specify
    pub default_periods: u32,

    /// Upstream request timeout in seconds
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source
    fn load_from(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let wds_base = var_or(lookup, "EXPLORER_WDS_BASE_URL", DEFAULT_WDS_BASE);
        let wds_base_url = Url::parse(&wds_base)
            .map_err(|e| AppError::Config(format!("Invalid WDS base URL {}: {}", wds_base, e)))?;

        Ok(Self {
            host: var_or(lookup, "EXPLORER_HOST", "127.0.0.1"),
            port: parse_var(lookup, "EXPLORER_PORT", "8750")?,
            wds_base_url,
            catalog_path: PathBuf::from(var_or(lookup, "EXPLORER_CATALOG", "data/catalog.json")),
            export_dir: PathBuf::from(var_or(lookup, "EXPLORER_EXPORT_DIR", ".")),
            default_periods: parse_var(lookup, "EXPLORER_DEFAULT_PERIODS", "12")?,
            http_timeout_secs: parse_var(lookup, "EXPLORER_HTTP_TIMEOUT_SECS", "30")?,
        })
    }

    /// Upstream URL for one WDS operation, e.g. `getDataFromVectorsAndLatestNPeriods`
    pub fn wds_endpoint(&self, operation: &str) -> Result<Url> {
        let base = self.wds_base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, operation))
            .map_err(|e| AppError::Config(format!("Invalid WDS endpoint {}: {}", operation, e)))
    }
}

fn var_or(lookup: &dyn Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| {
        info!("{} not set, using default: {}", key, default);
        default.to_string()
    })
}

fn parse_var<T: FromStr>(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T>
where
    T::Err: Display,
{
    var_or(lookup, key, default)
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {} value: {}", key, e)))
}
