use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    FullSync,
    IncrementalSync,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One reconciliation run as recorded in the job ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub summary: Map<String, Value>,
    pub error: Option<String>,
}

impl Job {
    /// Create a job record in the `running` state
    pub fn start(kind: JobKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            status: JobStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            duration_ms: 0,
            summary: Map::new(),
            error: None,
        }
    }

    pub fn record(&mut self, key: &str, value: impl Into<Value>) {
        self.summary.insert(key.to_string(), value.into());
    }

    /// Finish as `completed`; a run that hit recoverable errors still completes
    /// and carries the last error it saw.
    pub fn complete(&mut self, error: Option<String>) {
        self.finish(JobStatus::Completed, error);
    }

    pub fn fail(&mut self, error: String) {
        self.finish(JobStatus::Failed, Some(error));
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }

    fn finish(&mut self, status: JobStatus, error: Option<String>) {
        let now = Utc::now();
        self.status = status;
        self.completed_at = Some(now);
        self.duration_ms = (now - self.started_at).num_milliseconds().max(0) as u64;
        self.error = error;
    }
}
