use media_retention_models::ExclusionRecord;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::info;
use crate::error::EngineError;
use crate::persist::{read_json, write_json_atomic};

/// Persisted set of items protected from deletion
///
/// Keyed by the source-qualified item id. Every mutation is written to disk
/// before it becomes visible, inside the same critical section.
pub struct ExclusionStore {
    path: PathBuf,
    records: Mutex<HashMap<String, ExclusionRecord>>,
}

impl ExclusionStore {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let records: Vec<ExclusionRecord> = read_json(path, "Exclusion")?.unwrap_or_default();
        info!("Loaded {} exclusions from {}", records.len(), path.display());

        let records = records
            .into_iter()
            .map(|record| (record.external_id.clone(), record))
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            records: Mutex::new(records),
        })
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    /// Insert or replace the record for `record.external_id`
    pub fn add(&self, record: ExclusionRecord) -> Result<(), EngineError> {
        let mut records = self.lock();
        let mut updated = records.clone();
        updated.insert(record.external_id.clone(), record);
        self.persist(&updated)?;
        *records = updated;
        Ok(())
    }

    /// Remove and return the record for `id`, if there was one
    pub fn remove(&self, id: &str) -> Result<Option<ExclusionRecord>, EngineError> {
        let mut records = self.lock();
        if !records.contains_key(id) {
            return Ok(None);
        }
        let mut updated = records.clone();
        let removed = updated.remove(id);
        self.persist(&updated)?;
        *records = updated;
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<ExclusionRecord> {
        self.lock().get(id).cloned()
    }

    /// All records, oldest exclusion first
    pub fn get_all(&self) -> Vec<ExclusionRecord> {
        let mut all: Vec<ExclusionRecord> = self.lock().values().cloned().collect();
        all.sort_by(|a, b| {
            a.excluded_at
                .cmp(&b.excluded_at)
                .then_with(|| a.external_id.cmp(&b.external_id))
        });
        all
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn persist(&self, records: &HashMap<String, ExclusionRecord>) -> Result<(), EngineError> {
        let mut list: Vec<&ExclusionRecord> = records.values().collect();
        list.sort_by(|a, b| a.external_id.cmp(&b.external_id));
        write_json_atomic(&self.path, &list)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ExclusionRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
