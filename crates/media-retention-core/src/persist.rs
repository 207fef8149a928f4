use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};
use crate::error::EngineError;

/// Read a JSON file written by `write_json_atomic`
///
/// A missing file is `Ok(None)`. A file that no longer parses is backed up
/// next to the original and also treated as missing, so a corrupt store never
/// stops the engine from starting.
pub(crate) fn read_json<T>(path: &Path, label: &str) -> Result<Option<T>, EngineError>
where
    T: DeserializeOwned,
{
    if !path.exists() {
        debug!("{} file does not exist, starting empty", label);
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| EngineError::PersistenceFailure(format!("Failed to read {}: {}", path.display(), e)))?;

    match serde_json::from_str::<T>(&content) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            let backup_path = path.with_extension("json.bak");
            if let Err(backup_err) = std::fs::copy(path, &backup_path) {
                warn!(
                    "Failed to back up unreadable {} file: {}. Starting empty.",
                    label, backup_err
                );
            } else {
                info!(
                    "{} file is unreadable (error: {}). Backed up to {:?} and starting empty.",
                    label, e, backup_path
                );
            }
            Ok(None)
        }
    }
}

pub(crate) fn write_json_atomic<T>(path: &Path, value: &T) -> Result<(), EngineError>
where
    T: Serialize + ?Sized,
{
    let failure = |what: &str, e: &dyn std::fmt::Display| {
        EngineError::PersistenceFailure(format!("Failed to {} {}: {}", what, path.display(), e))
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| failure("create directory for", &e))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| failure("serialize", &e))?;

    // Atomic write: write to temp file, then rename
    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, json).map_err(|e| failure("write", &e))?;
    std::fs::rename(&temp_path, path).map_err(|e| failure("replace", &e))?;
    Ok(())
}
