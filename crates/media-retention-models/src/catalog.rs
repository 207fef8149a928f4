use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A movie as listed by the movie catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogMovie {
    pub id: u64, // Native catalog id
    pub title: String,
    pub year: Option<u32>,
    pub tmdb_id: Option<u64>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub has_file: bool,
    pub path: Option<String>,
    #[serde(default)]
    pub size_on_disk: u64,
    pub added: DateTime<Utc>,
}

/// A series as listed by the TV catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogSeries {
    pub id: u64, // Native catalog id
    pub title: String,
    pub year: Option<u32>,
    pub tvdb_id: Option<u64>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub path: Option<String>,
    #[serde(default)]
    pub size_on_disk: u64,
    #[serde(default)]
    pub episode_file_count: u32,
    pub added: DateTime<Utc>,
}

impl CatalogSeries {
    /// A series with no episode files on disk is not held media
    pub fn has_files(&self) -> bool {
        self.episode_file_count > 0
    }
}
