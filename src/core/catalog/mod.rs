// src/core/catalog/mod.rs

//! The media catalog collaborator. Building the catalog (scanning files,
//! reading tags) happens elsewhere; the server only reads the serialized
//! document and its version number.

mod file_catalog;

pub use file_catalog::FileCatalog;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CatalogError {
    #[error("cannot read catalog '{path}': {source}")]
    Read {
        path: String,
        source: Arc<std::io::Error>,
    },

    #[error("catalog document has no version attribute")]
    MissingVersion,

    #[error("catalog version '{0}' is not an integer")]
    InvalidVersion(String),
}

/// Read-only access to the current catalog.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// The version number of the catalog currently on offer.
    async fn current_version(&self) -> Result<i64, CatalogError>;

    /// The whole catalog document, as a single line.
    async fn current_payload(&self) -> Result<String, CatalogError>;
}
