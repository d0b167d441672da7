/// JSON-file backed implementation of CatalogSource
///
/// Reads the whole snapshot on every call so each request gets its own copy.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::catalog::{Catalog, CatalogSource};
use crate::errors::DiveQueryError;

pub struct JsonCatalogSource {
    path: PathBuf,
}

impl JsonCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonCatalogSource { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for JsonCatalogSource {
    async fn snapshot(&self) -> Result<Catalog, DiveQueryError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| {
                DiveQueryError::Catalog(format!(
                    "Failed to read catalog '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        let catalog: Catalog = serde_json::from_str(&raw)?;

        tracing::debug!(
            path = %self.path.display(),
            sites = catalog.dive_sites.len(),
            centers = catalog.diving_centers.len(),
            levels = catalog.certification_levels.len(),
            "Catalog snapshot loaded"
        );

        Ok(catalog)
    }
}
