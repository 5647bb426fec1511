//! Static product catalog
//!
//! The catalog is a JSON file listing StatCan products (tables) and the
//! vectors they contain. It is read once at startup and never mutated.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// One selectable vector inside a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    #[serde(rename = "vectorId")]
    pub vector_id: String,
    pub text: String,
}

/// A StatCan product (dataset/table) grouping several vectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "productId")]
    pub product_id: String,
    pub description: String,
    pub vectors: Vec<VectorEntry>,
}

/// Read-only product catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Load the catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        let products: Vec<Product> = serde_json::from_str(&raw)?;

        let vector_count: usize = products.iter().map(|p| p.vectors.len()).sum();
        info!(
            "Loaded catalog: {} products, {} vectors",
            products.len(),
            vector_count
        );

        Ok(Self { products })
    }

    pub fn from_products(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get_product(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.product_id == product_id)
    }

    /// Find a vector and its owning product by vector id
    pub fn find_vector(&self, vector_id: &str) -> Option<(&Product, &VectorEntry)> {
        self.products.iter().find_map(|p| {
            p.vectors
                .iter()
                .find(|v| v.vector_id == vector_id)
                .map(|v| (p, v))
        })
    }
}

/// Strip the `v` prefix from a catalog vector id and parse the numeric part.
///
/// The WDS API wants numeric ids (`41690973`) while the catalog and the UI
/// use the prefixed form (`v41690973`). Bare numeric strings are accepted.
pub fn numeric_vector_id(vector_id: &str) -> Result<i64> {
    let digits = vector_id.strip_prefix('v').unwrap_or(vector_id);
    digits.parse().map_err(|_| {
        AppError::Validation(format!("Invalid vector id: {}", vector_id))
    })
}
