use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::media::MediaType;

/// An item a user has permanently protected from deletion
///
/// `external_id` is source-qualified (the owning catalog's name plus its
/// native id), so it stays stable across restarts and re-ingests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExclusionRecord {
    pub external_id: String,
    pub source: String,
    pub media_type: MediaType,
    pub title: String, // Denormalized for display
    pub excluded_at: DateTime<Utc>,
    pub excluded_by: String,
    #[serde(default)]
    pub reason: String,
}
