use super::candidates::{format_size, title_with_year};
use super::context::AppContext;
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use media_retention_config::ConfigProvider;
use serde_json::json;

pub async fn run_leaving_soon(days: Option<u32>, output: &Output) -> Result<()> {
    let ctx = AppContext::open(true)?;
    ctx.load_library(output).await?;

    let window = days.unwrap_or_else(|| ctx.config.snapshot().app.leaving_soon_days);
    let items = ctx.engine.get_leaving_soon(Some(window)).await;

    match output.format() {
        OutputFormat::Human => {
            if items.is_empty() {
                output.success(format!("Nothing is scheduled for deletion in the next {} days", window));
                return Ok(());
            }
            let rows = items
                .iter()
                .map(|item| {
                    vec![
                        item.id.clone(),
                        title_with_year(&item.title, item.year),
                        item.media_type.to_string(),
                        format_size(item.file_size),
                        item.delete_after
                            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default(),
                        item.days_until_due.map(|d| d.to_string()).unwrap_or_default(),
                        item.deletion_reason.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            output.table(&["Id", "Title", "Type", "Size", "Delete after", "Days left", "Reason"], rows);
            output.info(format!("{} item(s) leaving within {} days", items.len(), window));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({ "window_days": window, "count": items.len(), "items": items }));
        }
    }

    Ok(())
}
