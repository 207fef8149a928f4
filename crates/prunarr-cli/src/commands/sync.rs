use super::context::{reconciliation_error, AppContext};
use super::sync_ui::SyncSpinner;
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use media_retention_models::{Job, JobStatus};
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_sync(incremental: bool, dry_run: bool, output: &Output) -> Result<()> {
    tracing::debug!(incremental, dry_run, "Sync command started");

    let ctx = AppContext::open(dry_run)?;
    let mut job = ctx.load_library(output).await?;

    if incremental {
        let spinner = SyncSpinner::start(output.is_interactive_human(), "Refreshing watch history...");
        job = ctx.engine.incremental_reconciliation().await.map_err(|e| {
            spinner.abandon("Watch history refresh failed");
            reconciliation_error(e)
        })?;
        spinner.finish("Watch history refreshed");
    }

    match output.format() {
        OutputFormat::Human => print_job_summary(&job, output),
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "success": job.status == JobStatus::Completed && job.error.is_none(),
                "job": job,
            }));
        }
    }

    if job.status == JobStatus::Failed {
        return Err(color_eyre::eyre::eyre!(
            "Sync failed: {}",
            job.error.unwrap_or_else(|| "unknown error".to_string())
        ));
    }
    Ok(())
}

fn print_job_summary(job: &Job, output: &Output) {
    let rows = job
        .summary
        .iter()
        .filter(|(key, _)| key.as_str() != "candidates")
        .map(|(key, value)| vec![key.replace('_', " "), value.to_string()])
        .collect();
    output.table(&["Step", "Result"], rows);

    if let Some(error) = &job.error {
        output.warn(format!("Completed with errors: {}", error.yellow()));
    } else {
        output.success(format!(
            "Sync completed in {} ms (job {})",
            job.duration_ms,
            job.id.dimmed()
        ));
    }

    let dry_run = job.summary.get("dry_run").and_then(|v| v.as_bool()).unwrap_or(false);
    let due = job.summary.get("scheduled_deletions").and_then(|v| v.as_u64()).unwrap_or(0);
    if dry_run && due > 0 {
        output.info(format!(
            "Dry-run: {} item(s) are due for deletion. Run 'prunarr candidates' to review them.",
            due
        ));
    }
}
