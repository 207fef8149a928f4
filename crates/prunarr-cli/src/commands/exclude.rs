use super::context::AppContext;
use crate::output::{Output, OutputFormat};
use crate::ExcludeCommands;
use color_eyre::Result;
use media_retention_core::{EngineError, ExclusionStore};
use media_retention_config::PathManager;
use serde_json::json;

pub async fn run_exclude(cmd: ExcludeCommands, output: &Output) -> Result<()> {
    match cmd {
        ExcludeCommands::Add { id, reason, by } => add(&id, &reason, by, output).await,
        ExcludeCommands::Remove { id } => remove(&id, output).await,
        ExcludeCommands::List => list(output),
    }
}

async fn add(id: &str, reason: &str, by: Option<String>, output: &Output) -> Result<()> {
    // The item has to be in the library, which only a reconciliation fills
    let ctx = AppContext::open(true)?;
    ctx.load_library(output).await?;

    let actor = by
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "cli".to_string());

    let record = match ctx.engine.add_exclusion(id, reason, &actor).await {
        Ok(record) => record,
        Err(EngineError::NotFound(_)) => {
            return Err(color_eyre::eyre::eyre!(
                "No media item with id '{}'. Ids look like '<catalog>-<id>', see 'prunarr candidates'.",
                id
            ));
        }
        Err(e) => return Err(e.into()),
    };

    match output.format() {
        OutputFormat::Human => output.success(format!("Excluded {} ({}) from deletion", record.title, record.external_id)),
        OutputFormat::Json | OutputFormat::JsonPretty => output.json(&json!({ "excluded": record })),
    }
    Ok(())
}

async fn remove(id: &str, output: &Output) -> Result<()> {
    let ctx = AppContext::open(true)?;
    ctx.load_library(output).await?;

    match ctx.engine.remove_exclusion(id).await {
        Ok(()) => {}
        // Items gone from every catalog can still be un-excluded
        Err(EngineError::NotFound(_)) => {
            if ctx.engine.exclusions().remove(id)?.is_none() {
                return Err(color_eyre::eyre::eyre!("'{}' is not excluded", id));
            }
        }
        Err(e) => return Err(e.into()),
    }

    match output.format() {
        OutputFormat::Human => {
            output.success(format!("Removed exclusion for {}", id));
            if let Some(item) = ctx.engine.get_media_by_id(id).await {
                if let Some(reason) = item.deletion_reason {
                    output.info(reason);
                }
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => output.json(&json!({ "removed": id })),
    }
    Ok(())
}

fn list(output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let store = ExclusionStore::load(&path_manager.exclusions_file())?;
    let records = store.get_all();

    match output.format() {
        OutputFormat::Human => {
            if records.is_empty() {
                output.info("No exclusions");
                return Ok(());
            }
            let rows = records
                .iter()
                .map(|r| {
                    vec![
                        r.external_id.clone(),
                        r.title.clone(),
                        r.media_type.to_string(),
                        r.excluded_at.format("%Y-%m-%d").to_string(),
                        r.excluded_by.clone(),
                        r.reason.clone(),
                    ]
                })
                .collect();
            output.table(&["Id", "Title", "Type", "Excluded", "By", "Reason"], rows);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({ "count": records.len(), "exclusions": records }));
        }
    }
    Ok(())
}
