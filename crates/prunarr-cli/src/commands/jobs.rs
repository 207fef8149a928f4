use super::candidates::format_timestamp;
use super::context::load_config;
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use media_retention_config::PathManager;
use media_retention_core::JobLedger;
use media_retention_models::{Job, JobKind, JobStatus};
use owo_colors::OwoColorize;
use serde_json::json;

/// Read the ledger directly; no engine or sources are needed
pub fn run_jobs(limit: usize, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let ledger = JobLedger::load(&path_manager.jobs_file(), config.app.max_jobs)?;
    let jobs = ledger.get_recent(limit);

    match output.format() {
        OutputFormat::Human => {
            if jobs.is_empty() {
                output.info("No reconciliation runs recorded yet");
                return Ok(());
            }
            let rows = jobs.iter().map(job_row).collect();
            output.table(&["Id", "Kind", "Status", "Started", "Completed", "Duration", "Error"], rows);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({ "count": jobs.len(), "jobs": jobs }));
        }
    }

    Ok(())
}

fn job_row(job: &Job) -> Vec<String> {
    let kind = match job.kind {
        JobKind::FullSync => "full",
        JobKind::IncrementalSync => "incremental",
    };
    let status = match job.status {
        JobStatus::Pending => "pending".dimmed().to_string(),
        JobStatus::Running => "running".cyan().to_string(),
        JobStatus::Completed if job.error.is_some() => "completed".yellow().to_string(),
        JobStatus::Completed => "completed".green().to_string(),
        JobStatus::Failed => "failed".red().to_string(),
    };

    vec![
        job.id.clone(),
        kind.to_string(),
        status,
        format_timestamp(Some(job.started_at)),
        format_timestamp(job.completed_at),
        format!("{} ms", job.duration_ms),
        job.error.clone().unwrap_or_default(),
    ]
}
