//! Capability traits for the systems the engine reconciles
//!
//! Each external system is modeled only by what the engine needs from it.
//! Concrete integrations implement these traits; the core never depends on a
//! vendor API directly.

use async_trait::async_trait;
use media_retention_models::{CatalogMovie, CatalogSeries, MediaRequest, PlayRecord};
use crate::error::SourceError;

/// System of record for movie files
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Name used in logs and as the prefix of source-qualified item ids
    fn source_name(&self) -> &str;

    /// List every movie the catalog knows about, with or without a file on disk
    async fn list_movies(&self) -> Result<Vec<CatalogMovie>, SourceError>;

    /// Remove a movie from the catalog
    ///
    /// # Arguments
    /// * `id` - The catalog's native movie id
    /// * `delete_files` - Also remove the files on disk
    async fn delete_movie(&self, id: u64, delete_files: bool) -> Result<(), SourceError>;
}

/// System of record for series files
#[async_trait]
pub trait TvCatalog: Send + Sync {
    fn source_name(&self) -> &str;

    /// List every series the catalog knows about
    async fn list_series(&self) -> Result<Vec<CatalogSeries>, SourceError>;

    /// Remove a series from the catalog
    ///
    /// # Arguments
    /// * `id` - The catalog's native series id
    /// * `delete_files` - Also remove the files on disk
    async fn delete_series(&self, id: u64, delete_files: bool) -> Result<(), SourceError>;
}

/// Reports play counts and last-played timestamps
///
/// The engine never deletes anything here. After a catalog deletion it only
/// asks the source to rescan so that it notices the removal on its own.
#[async_trait]
pub trait WatchHistorySource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Playback summaries for every movie and show in the library
    async fn list_played(&self) -> Result<Vec<PlayRecord>, SourceError>;

    /// Ask the source to rescan its libraries
    async fn refresh_library(&self) -> Result<(), SourceError>;
}

/// Records user requests for media and their approval state
#[async_trait]
pub trait RequestSource: Send + Sync {
    fn source_name(&self) -> &str;

    async fn list_requests(&self) -> Result<Vec<MediaRequest>, SourceError>;
}
