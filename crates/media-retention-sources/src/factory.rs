//! Builds the configured collaborators from configuration
//!
//! Every source is optional. The sync engine skips any capability that is
//! not present in the resulting `SourceSet`.

use media_retention_config::{Config, SourceEntry, MOVIE_CATALOG_NAME, TV_CATALOG_NAME};
use std::sync::Arc;
use tracing::info;
use crate::snapshot::{SnapshotMovieCatalog, SnapshotRequestSource, SnapshotTvCatalog, SnapshotWatchHistory};
use crate::traits::{MovieCatalog, RequestSource, TvCatalog, WatchHistorySource};

/// The collaborators a sync engine reconciles, in ingest order
#[derive(Clone, Default)]
pub struct SourceSet {
    pub movie_catalog: Option<Arc<dyn MovieCatalog>>,
    pub tv_catalog: Option<Arc<dyn TvCatalog>>,
    pub watch_history: Option<Arc<dyn WatchHistorySource>>,
    pub watch_history_secondary: Option<Arc<dyn WatchHistorySource>>,
    pub requests: Option<Arc<dyn RequestSource>>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movie_catalog(mut self, catalog: Arc<dyn MovieCatalog>) -> Self {
        self.movie_catalog = Some(catalog);
        self
    }

    pub fn with_tv_catalog(mut self, catalog: Arc<dyn TvCatalog>) -> Self {
        self.tv_catalog = Some(catalog);
        self
    }

    pub fn with_watch_history(mut self, source: Arc<dyn WatchHistorySource>) -> Self {
        self.watch_history = Some(source);
        self
    }

    pub fn with_secondary_watch_history(mut self, source: Arc<dyn WatchHistorySource>) -> Self {
        self.watch_history_secondary = Some(source);
        self
    }

    pub fn with_requests(mut self, source: Arc<dyn RequestSource>) -> Self {
        self.requests = Some(source);
        self
    }

    /// Names of the configured sources for log lines
    pub fn source_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(s) = &self.movie_catalog {
            names.push(s.source_name().to_string());
        }
        if let Some(s) = &self.tv_catalog {
            names.push(s.source_name().to_string());
        }
        if let Some(s) = &self.watch_history {
            names.push(s.source_name().to_string());
        }
        if let Some(s) = &self.watch_history_secondary {
            names.push(s.source_name().to_string());
        }
        if let Some(s) = &self.requests {
            names.push(s.source_name().to_string());
        }
        names
    }
}

/// Factory for the snapshot-backed sources described in `[sources]`
pub struct SourceFactory;

impl SourceFactory {
    /// Create all enabled sources from configuration
    pub fn create_all_sources(config: &Config) -> SourceSet {
        let sources = &config.sources;
        let mut set = SourceSet::new();

        if let Some(entry) = enabled(&sources.movie_catalog) {
            let name = entry.name_or(MOVIE_CATALOG_NAME);
            set = set.with_movie_catalog(Arc::new(SnapshotMovieCatalog::new(name, &entry.path)));
        }
        if let Some(entry) = enabled(&sources.tv_catalog) {
            let name = entry.name_or(TV_CATALOG_NAME);
            set = set.with_tv_catalog(Arc::new(SnapshotTvCatalog::new(name, &entry.path)));
        }
        if let Some(entry) = enabled(&sources.watch_history) {
            let name = entry.name_or("watch-history");
            set = set.with_watch_history(Arc::new(SnapshotWatchHistory::new(name, &entry.path)));
        }
        if let Some(entry) = enabled(&sources.watch_history_secondary) {
            let name = entry.name_or("watch-history-secondary");
            set = set.with_secondary_watch_history(Arc::new(SnapshotWatchHistory::new(name, &entry.path)));
        }
        if let Some(entry) = enabled(&sources.requests) {
            let name = entry.name_or("requests");
            set = set.with_requests(Arc::new(SnapshotRequestSource::new(name, &entry.path)));
        }

        info!(
            operation = "sources_created",
            sources = ?set.source_names(),
            "Created {} sources from configuration",
            set.source_names().len()
        );
        set
    }
}

fn enabled(entry: &Option<SourceEntry>) -> Option<&SourceEntry> {
    entry.as_ref().filter(|e| e.enabled)
}
