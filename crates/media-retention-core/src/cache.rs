use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Process-wide cache of derived read-side data
///
/// The engine only needs to drop everything after the collection changes;
/// readers use `get`/`insert` for views that are expensive to recompute.
pub trait SharedCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn insert(&self, key: &str, value: Value);
    fn clear(&self);
}

/// In-memory cache whose entries expire after a fixed TTL
pub struct TtlCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, Value)>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SharedCache for TtlCache {
    fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => {
                debug!("Cache hit: {}", key);
                Some(value.clone())
            }
            Some(_) => {
                debug!("Cache expired: {}", key);
                None
            }
            None => None,
        }
    }

    fn insert(&self, key: &str, value: Value) {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
        entries.insert(key.to_string(), (Instant::now(), value));
    }

    fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !entries.is_empty() {
            debug!("Clearing {} cached entries", entries.len());
        }
        entries.clear();
    }
}
