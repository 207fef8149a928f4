// Cross-system matching of catalog items against watch history and requests

use media_retention_models::{MediaIds, MediaItem, MediaRequest, MediaType, PlayRecord};
use std::collections::HashMap;

/// Key two systems agree on for the same logical item: the media type plus
/// the id field that type matches on (movie-db id for movies, TV-db id for
/// shows).
pub type MatchKey = (MediaType, u64);

pub fn match_key(media_type: MediaType, ids: &MediaIds) -> Option<MatchKey> {
    media_type.matching_id(ids).map(|id| (media_type, id))
}

/// Index any collection by its match key; the first record for a key wins
pub fn index_by_match_key<'a, T, F>(records: &'a [T], key_of: F) -> HashMap<MatchKey, &'a T>
where
    F: Fn(&T) -> Option<MatchKey>,
{
    let mut index = HashMap::new();
    for record in records {
        if let Some(key) = key_of(record) {
            index.entry(key).or_insert(record);
        }
    }
    index
}

/// Lowercase, keep letters and digits, collapse everything else to single spaces
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub enum WatchMatch<'a> {
    /// Same matching id on both sides
    Exact(&'a PlayRecord),
    /// Only the normalized title agrees; the ids have drifted apart
    TitleOnly(&'a PlayRecord),
    None,
}

/// Lookup structure over one watch-history listing
pub struct WatchIndex<'a> {
    by_key: HashMap<MatchKey, &'a PlayRecord>,
    by_title: HashMap<(MediaType, String), &'a PlayRecord>,
}

impl<'a> WatchIndex<'a> {
    pub fn build(records: &'a [PlayRecord]) -> Self {
        let by_key = index_by_match_key(records, |r| match_key(r.media_type, &r.ids));
        let mut by_title = HashMap::new();
        for record in records {
            by_title
                .entry((record.media_type, normalize_title(&record.title)))
                .or_insert(record);
        }
        Self { by_key, by_title }
    }

    pub fn lookup(&self, item: &MediaItem) -> WatchMatch<'a> {
        if let Some(key) = match_key(item.media_type, &item.ids) {
            if let Some(record) = self.by_key.get(&key).copied() {
                return WatchMatch::Exact(record);
            }
        }
        match self.by_title.get(&(item.media_type, normalize_title(&item.title))).copied() {
            Some(record) => WatchMatch::TitleOnly(record),
            None => WatchMatch::None,
        }
    }

    /// Exact matches only; used when merging a secondary source
    pub fn lookup_exact(&self, item: &MediaItem) -> Option<&'a PlayRecord> {
        match_key(item.media_type, &item.ids).and_then(|key| self.by_key.get(&key).copied())
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Index of requests that mark an item as requested
///
/// When several qualifying requests share a key, one with an identified
/// requester is preferred so that user rules can match.
pub fn index_requests(requests: &[MediaRequest]) -> HashMap<MatchKey, &MediaRequest> {
    let mut index: HashMap<MatchKey, &MediaRequest> = HashMap::new();
    for request in requests.iter().filter(|r| r.status.marks_requested()) {
        let Some(key) = match_key(request.media_type, &request.ids) else {
            continue;
        };
        let identified = |r: &MediaRequest| r.requested_by.as_ref().is_some_and(|u| u.is_identified());
        let replace = match index.get(&key) {
            Some(existing) => !identified(*existing) && identified(request),
            None => true,
        };
        if replace {
            index.insert(key, request);
        }
    }
    index
}
