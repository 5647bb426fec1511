//! Statistics Canada Web Data Service (WDS) client

pub mod client;
pub mod types;

pub use client::{WdsApi, WdsClient};
