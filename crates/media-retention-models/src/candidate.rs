use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::media::{MediaItem, MediaType};
use crate::request::Requester;

/// Preview of an item whose scheduled deletion time has passed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeletionCandidate {
    pub id: String,
    pub title: String,
    pub year: Option<u32>,
    pub media_type: MediaType,
    pub file_size: u64,
    pub days_overdue: i64,
    pub reason: String,
    pub last_watched: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<Requester>,
}

impl DeletionCandidate {
    pub fn from_item(item: &MediaItem, now: DateTime<Utc>) -> Self {
        let days_overdue = item
            .delete_after
            .map(|due| (now - due).num_days().max(0))
            .unwrap_or(0);

        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            year: item.year,
            media_type: item.media_type,
            file_size: item.file_size,
            days_overdue,
            reason: item.deletion_reason.clone().unwrap_or_default(),
            last_watched: item.last_watched,
            requested_by: item.requested_by.clone(),
        }
    }
}
