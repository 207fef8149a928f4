use serde::{Deserialize, Serialize};

/// External identifiers an item is known by across systems
///
/// These are only used for cross-system matching. Ownership of an item is
/// decided by which catalog id is populated (`movie_catalog_id` or
/// `tv_catalog_id`), never by the provider ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaIds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvdb_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    /// Streaming-server item id, filled in from watch history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_catalog_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tv_catalog_id: Option<u64>,
}

impl MediaIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge IDs from another source, keeping all available IDs
    ///
    /// Only fills in None values. Existing values are not overwritten.
    pub fn merge(&mut self, other: &MediaIds) {
        if self.tmdb_id.is_none() {
            self.tmdb_id = other.tmdb_id;
        }
        if self.tvdb_id.is_none() {
            self.tvdb_id = other.tvdb_id;
        }
        if self.imdb_id.is_none() {
            self.imdb_id = other.imdb_id.clone();
        }
        if self.server_id.is_none() {
            self.server_id = other.server_id.clone();
        }
        if self.movie_catalog_id.is_none() {
            self.movie_catalog_id = other.movie_catalog_id;
        }
        if self.tv_catalog_id.is_none() {
            self.tv_catalog_id = other.tv_catalog_id;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tmdb_id.is_none()
            && self.tvdb_id.is_none()
            && self.imdb_id.is_none()
            && self.server_id.is_none()
            && self.movie_catalog_id.is_none()
            && self.tv_catalog_id.is_none()
    }

    /// True when some catalog claims ownership of the underlying files
    pub fn has_catalog_owner(&self) -> bool {
        self.movie_catalog_id.is_some() || self.tv_catalog_id.is_some()
    }
}
