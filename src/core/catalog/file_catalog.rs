// src/core/catalog/file_catalog.rs

//! A catalog backed by the serialized library document on disk.

use super::{CatalogError, CatalogProvider};
use async_trait::async_trait;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

lazy_static! {
    static ref ROOT_VERSION: Regex =
        Regex::new(r#"<musicLibrary\b[^>]*?\bversion="([^"]*)""#).unwrap();
}

#[derive(Debug, Clone)]
struct Loaded {
    modified: Option<SystemTime>,
    payload: Arc<str>,
    version: Result<i64, CatalogError>,
}

/// Serves the `musicLibrary` document found at `path`.
///
/// The file is re-read only when its modification time changes, so a catalog
/// rebuilt by an external scanner is picked up without a restart.
#[derive(Debug)]
pub struct FileCatalog {
    path: PathBuf,
    cache: Mutex<Option<Loaded>>,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_error(&self, e: std::io::Error) -> CatalogError {
        CatalogError::Read {
            path: self.path.display().to_string(),
            source: Arc::new(e),
        }
    }

    async fn load(&self) -> Result<Loaded, CatalogError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.read_error(e))?;
        let modified = metadata.modified().ok();

        let cached = self.cache.lock().clone();
        if let Some(cached) = cached
            && cached.modified.is_some()
            && cached.modified == modified
        {
            return Ok(cached);
        }

        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.read_error(e))?;
        let loaded = Loaded {
            modified,
            version: parse_version(&raw),
            payload: flatten_document(&raw).into(),
        };
        match &loaded.version {
            Ok(v) => info!(
                "Loaded catalog '{}' (version {}).",
                self.path.display(),
                v
            ),
            Err(e) => debug!(
                "Catalog '{}' loaded without a usable version: {}",
                self.path.display(),
                e
            ),
        }
        *self.cache.lock() = Some(loaded.clone());
        Ok(loaded)
    }
}

#[async_trait]
impl CatalogProvider for FileCatalog {
    async fn current_version(&self) -> Result<i64, CatalogError> {
        self.load().await?.version
    }

    async fn current_payload(&self) -> Result<String, CatalogError> {
        Ok(self.load().await?.payload.to_string())
    }
}

/// Reads the `version` attribute of the `musicLibrary` root element.
pub(crate) fn parse_version(document: &str) -> Result<i64, CatalogError> {
    let raw = ROOT_VERSION
        .captures(document)
        .and_then(|caps| caps.get(1))
        .ok_or(CatalogError::MissingVersion)?
        .as_str();
    raw.trim()
        .parse()
        .map_err(|_| CatalogError::InvalidVersion(raw.to_string()))
}

/// The reply to `UPDATE` must fit on one line.
pub(crate) fn flatten_document(document: &str) -> String {
    document.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}
