//! JSON snapshot implementations of every source capability
//!
//! Each collaborator is backed by a JSON array exported from the real system.
//! Catalog deletions rewrite the snapshot so that the next ingest no longer
//! sees the removed entry.

use async_trait::async_trait;
use media_retention_models::{CatalogMovie, CatalogSeries, MediaRequest, PlayRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use crate::error::SourceError;
use crate::traits::{MovieCatalog, RequestSource, TvCatalog, WatchHistorySource};

struct SnapshotFile {
    source: String,
    path: PathBuf,
}

impl SnapshotFile {
    fn new(source: &str, path: &Path) -> Self {
        Self {
            source: source.to_string(),
            path: path.to_path_buf(),
        }
    }

    async fn load<T>(&self) -> Result<Vec<T>, SourceError>
    where
        T: DeserializeOwned,
    {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SourceError::new(&self.source, format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        match serde_json::from_str::<Vec<T>>(&content) {
            Ok(items) => {
                debug!("Snapshot loaded: {} ({} items)", self.source, items.len());
                Ok(items)
            }
            Err(e) => {
                warn!("Snapshot for {} is not valid JSON: {}", self.source, e);
                Err(SourceError::new(
                    &self.source,
                    format!("Failed to parse {}: {}", self.path.display(), e),
                ))
            }
        }
    }

    async fn save<T>(&self, items: &[T]) -> Result<(), SourceError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| SourceError::new(&self.source, format!("Failed to serialize snapshot: {}", e)))?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json).await.map_err(|e| {
            SourceError::new(&self.source, format!("Failed to write {}: {}", temp_path.display(), e))
        })?;
        tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| {
            SourceError::new(&self.source, format!("Failed to replace {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }

    /// Drop the first entry matching `is_target` and rewrite the file
    async fn remove_where<T, F>(&self, is_target: F, what: &str) -> Result<(), SourceError>
    where
        T: DeserializeOwned + Serialize,
        F: Fn(&T) -> bool,
    {
        let mut items: Vec<T> = self.load().await?;
        let Some(index) = items.iter().position(|item| is_target(item)) else {
            return Err(SourceError::new(&self.source, format!("{} not found", what)));
        };
        items.remove(index);
        self.save(&items).await
    }
}

pub struct SnapshotMovieCatalog {
    name: String,
    file: SnapshotFile,
    write_lock: Mutex<()>,
}

impl SnapshotMovieCatalog {
    pub fn new(name: &str, path: &Path) -> Self {
        Self {
            name: name.to_string(),
            file: SnapshotFile::new(name, path),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl MovieCatalog for SnapshotMovieCatalog {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn list_movies(&self) -> Result<Vec<CatalogMovie>, SourceError> {
        self.file.load().await
    }

    async fn delete_movie(&self, id: u64, delete_files: bool) -> Result<(), SourceError> {
        let _guard = self.write_lock.lock().await;
        self.file
            .remove_where(|movie: &CatalogMovie| movie.id == id, &format!("Movie {}", id))
            .await?;
        info!(source = %self.name, id, delete_files, "Removed movie from catalog snapshot");
        Ok(())
    }
}

pub struct SnapshotTvCatalog {
    name: String,
    file: SnapshotFile,
    write_lock: Mutex<()>,
}

impl SnapshotTvCatalog {
    pub fn new(name: &str, path: &Path) -> Self {
        Self {
            name: name.to_string(),
            file: SnapshotFile::new(name, path),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl TvCatalog for SnapshotTvCatalog {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn list_series(&self) -> Result<Vec<CatalogSeries>, SourceError> {
        self.file.load().await
    }

    async fn delete_series(&self, id: u64, delete_files: bool) -> Result<(), SourceError> {
        let _guard = self.write_lock.lock().await;
        self.file
            .remove_where(|series: &CatalogSeries| series.id == id, &format!("Series {}", id))
            .await?;
        info!(source = %self.name, id, delete_files, "Removed series from catalog snapshot");
        Ok(())
    }
}

pub struct SnapshotWatchHistory {
    name: String,
    file: SnapshotFile,
}

impl SnapshotWatchHistory {
    pub fn new(name: &str, path: &Path) -> Self {
        Self {
            name: name.to_string(),
            file: SnapshotFile::new(name, path),
        }
    }
}

#[async_trait]
impl WatchHistorySource for SnapshotWatchHistory {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn list_played(&self) -> Result<Vec<PlayRecord>, SourceError> {
        self.file.load().await
    }

    /// A snapshot has no library to rescan; the request only checks the
    /// export is still readable.
    async fn refresh_library(&self) -> Result<(), SourceError> {
        let records: Vec<PlayRecord> = self.file.load().await?;
        debug!(source = %self.name, records = records.len(), "Library refresh requested");
        Ok(())
    }
}

pub struct SnapshotRequestSource {
    name: String,
    file: SnapshotFile,
}

impl SnapshotRequestSource {
    pub fn new(name: &str, path: &Path) -> Self {
        Self {
            name: name.to_string(),
            file: SnapshotFile::new(name, path),
        }
    }
}

#[async_trait]
impl RequestSource for SnapshotRequestSource {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn list_requests(&self) -> Result<Vec<MediaRequest>, SourceError> {
        self.file.load().await
    }
}
