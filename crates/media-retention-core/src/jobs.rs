use media_retention_models::Job;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use crate::error::EngineError;
use crate::persist::{read_json, write_json_atomic};

/// Bounded, most-recent-first history of reconciliation runs
pub struct JobLedger {
    path: PathBuf,
    max_jobs: usize,
    jobs: Mutex<Vec<Job>>,
}

impl JobLedger {
    pub fn load(path: &Path, max_jobs: usize) -> Result<Self, EngineError> {
        let max_jobs = max_jobs.max(1);
        let mut jobs: Vec<Job> = read_json(path, "Job ledger")?.unwrap_or_default();
        jobs.truncate(max_jobs);
        debug!("Loaded {} jobs from {}", jobs.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            max_jobs,
            jobs: Mutex::new(jobs),
        })
    }

    /// Record a new job at the head of the ledger, evicting the oldest
    /// entries beyond `max_jobs`
    pub fn add(&self, job: Job) -> Result<(), EngineError> {
        let mut jobs = self.lock();
        let mut updated = jobs.clone();
        updated.insert(0, job);
        updated.truncate(self.max_jobs);
        write_json_atomic(&self.path, &updated)?;
        *jobs = updated;
        Ok(())
    }

    /// Replace the stored job with the same id
    pub fn update(&self, job: Job) -> Result<(), EngineError> {
        let mut jobs = self.lock();
        let index = jobs
            .iter()
            .position(|j| j.id == job.id)
            .ok_or_else(|| EngineError::NotFound(format!("job {}", job.id)))?;
        let mut updated = jobs.clone();
        updated[index] = job;
        write_json_atomic(&self.path, &updated)?;
        *jobs = updated;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Job, EngineError> {
        self.lock()
            .iter()
            .find(|j| j.id == id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("job {}", id)))
    }

    pub fn get_recent(&self, n: usize) -> Vec<Job> {
        self.lock().iter().take(n).cloned().collect()
    }

    pub fn get_latest(&self) -> Option<Job> {
        self.lock().first().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Job>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
