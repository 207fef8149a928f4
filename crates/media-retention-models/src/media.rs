use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use crate::media_ids::MediaIds;
use crate::request::Requester;

/// Canonical media entry held by the sync engine.
///
/// Identity, provenance, lifecycle and request attributes come from the
/// source systems. The fields after `requested_by` are re-derived on every
/// reconciliation pass and are never written by callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: String,
    pub media_type: MediaType,
    pub title: String,
    pub year: Option<u32>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub ids: MediaIds,
    pub added_at: DateTime<Utc>,
    pub last_watched: Option<DateTime<Utc>>, // None means never watched
    #[serde(default)]
    pub watch_count: u32,
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub is_requested: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<Requester>,

    #[serde(default)]
    pub is_excluded: bool,
    pub delete_after: Option<DateTime<Utc>>,
    pub days_until_due: Option<i64>,
    pub deletion_reason: Option<String>,
    pub watch_match: Option<MatchStatus>,
    pub watch_match_detail: Option<String>,
}

impl MediaItem {
    pub fn new(id: String, media_type: MediaType, title: String, added_at: DateTime<Utc>) -> Self {
        Self {
            id,
            media_type,
            title,
            year: None,
            tags: BTreeSet::new(),
            ids: MediaIds::new(),
            added_at,
            last_watched: None,
            watch_count: 0,
            file_path: None,
            file_size: 0,
            is_requested: false,
            requested_by: None,
            is_excluded: false,
            delete_after: None,
            days_until_due: None,
            deletion_reason: None,
            watch_match: None,
            watch_match_detail: None,
        }
    }

    /// Whether any playback has ever been recorded for this item
    pub fn has_been_watched(&self) -> bool {
        self.watch_count > 0 || self.last_watched.is_some()
    }

    /// Timestamp retention durations are counted from: last watch, else when added
    pub fn retention_base(&self) -> DateTime<Utc> {
        self.last_watched.unwrap_or(self.added_at)
    }

    /// The cross-system id used to match this item against watch history and requests
    pub fn matching_id(&self) -> Option<u64> {
        self.media_type.matching_id(&self.ids)
    }

    pub fn clear_schedule(&mut self) {
        self.delete_after = None;
        self.days_until_due = None;
        self.deletion_reason = None;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Show,
}

impl MediaType {
    /// Movies match on the movie-database id, shows on the TV-database id.
    pub fn matching_id(&self, ids: &MediaIds) -> Option<u64> {
        match self {
            MediaType::Movie => ids.tmdb_id,
            MediaType::Show => ids.tvdb_id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Show => "show",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of matching an item against the watch-history source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStatus {
    Matched,
    NotFound,
    /// A title matched but the external ids disagree between systems
    MetadataMismatch,
}
