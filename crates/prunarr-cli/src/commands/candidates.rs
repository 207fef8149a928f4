use super::context::AppContext;
use crate::output::{Output, OutputFormat};
use chrono::{DateTime, Utc};
use color_eyre::Result;
use media_retention_models::DeletionCandidate;
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Preview what a reconciliation would delete; never deletes anything
pub async fn run_candidates(csv: Option<PathBuf>, output: &Output) -> Result<()> {
    let ctx = AppContext::open(true)?;
    ctx.load_library(output).await?;

    let (count, candidates) = ctx.engine.compute_deletion_candidates().await;

    if let Some(path) = &csv {
        export_csv(path, &candidates)?;
        tracing::info!(operation = "csv_export", path = %path.display(), rows = count, "Candidates exported");
    }

    match output.format() {
        OutputFormat::Human => {
            if candidates.is_empty() {
                output.success("Nothing is due for deletion");
            } else {
                let rows = candidates
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.clone(),
                            title_with_year(&c.title, c.year),
                            c.media_type.to_string(),
                            format_size(c.file_size),
                            c.days_overdue.to_string(),
                            c.requested_by.as_ref().map(|r| r.display_name()).unwrap_or_default(),
                            c.reason.clone(),
                        ]
                    })
                    .collect();
                output.table(
                    &["Id", "Title", "Type", "Size", "Days overdue", "Requested by", "Reason"],
                    rows,
                );
                let total: u64 = candidates.iter().map(|c| c.file_size).sum();
                output.warn(format!(
                    "{} item(s) due for deletion, {} in total",
                    count.to_string().bold(),
                    format_size(total)
                ));
            }
            if let Some(path) = &csv {
                output.info(format!("Exported to {}", path.display()));
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({ "count": count, "candidates": candidates }));
        }
    }

    Ok(())
}

fn export_csv(path: &Path, candidates: &[DeletionCandidate]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create {}: {}", path.display(), e))?;

    writer.write_record([
        "id",
        "title",
        "year",
        "media_type",
        "file_size",
        "days_overdue",
        "last_watched",
        "requested_by",
        "reason",
    ])?;
    for c in candidates {
        writer.write_record([
            c.id.clone(),
            c.title.clone(),
            c.year.map(|y| y.to_string()).unwrap_or_default(),
            c.media_type.to_string(),
            c.file_size.to_string(),
            c.days_overdue.to_string(),
            format_timestamp(c.last_watched),
            c.requested_by.as_ref().map(|r| r.display_name()).unwrap_or_default(),
            c.reason.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn title_with_year(title: &str, year: Option<u32>) -> String {
    match year {
        Some(year) => format!("{} ({})", title, year),
        None => title.to_string(),
    }
}

pub fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.to_rfc3339()).unwrap_or_default()
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
