use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::media::MediaType;
use crate::media_ids::MediaIds;

/// Playback summary for one library item on a watch-history source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayRecord {
    pub media_type: MediaType,
    pub server_id: String, // Streaming-server item id
    pub title: String,
    pub year: Option<u32>,
    #[serde(default)]
    pub ids: MediaIds, // Provider ids used for matching
    pub last_played: Option<DateTime<Utc>>,
    #[serde(default)]
    pub play_count: u32,
}
