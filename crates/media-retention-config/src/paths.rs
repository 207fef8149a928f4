use anyhow::Result;
use std::path::{Path, PathBuf};

/// Overrides every other base-directory choice when set
pub const BASE_PATH_ENV: &str = "PRUNARR_BASE_PATH";

/// Mount point baked into the container image
const CONTAINER_BASE: &str = "/app";

/// Where prunarr keeps `config.toml`, its state files and its logs
///
/// ```text
/// <base>/config.toml
/// <base>/data/exclusions.json
/// <base>/data/jobs.json
/// <base>/logs/prunarr.log
/// ```
pub struct PathManager {
    base: PathBuf,
}

impl PathManager {
    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    /// `$PRUNARR_BASE_PATH`, then the container mount when present, then
    /// the platform config directory (`~/.config/prunarr` on Linux)
    pub fn resolve() -> Result<Self> {
        if let Some(base) = std::env::var_os(BASE_PATH_ENV) {
            return Ok(Self::with_base(PathBuf::from(base)));
        }
        let container = Path::new(CONTAINER_BASE);
        if container.is_dir() {
            return Ok(Self::with_base(container.to_path_buf()));
        }
        let platform = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("No platform config directory"))?;
        Ok(Self::with_base(platform.join("prunarr")))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base.join("data")
    }

    fn log_dir(&self) -> PathBuf {
        self.base.join("logs")
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.toml")
    }

    pub fn exclusions_file(&self) -> PathBuf {
        self.data_dir().join("exclusions.json")
    }

    pub fn jobs_file(&self) -> PathBuf {
        self.data_dir().join("jobs.json")
    }

    pub fn daemon_log_file(&self) -> PathBuf {
        self.log_dir().join("prunarr.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [self.base.clone(), self.data_dir(), self.log_dir()] {
            std::fs::create_dir_all(&dir)
                .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", dir.display(), e))?;
        }
        Ok(())
    }
}

impl Default for PathManager {
    /// Falls back to the container mount when nothing else resolves
    fn default() -> Self {
        Self::resolve().unwrap_or_else(|_| Self::with_base(PathBuf::from(CONTAINER_BASE)))
    }
}
