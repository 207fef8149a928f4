use crate::config::Config;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::info;

/// Source of the current configuration snapshot
///
/// The rules engine asks for a fresh snapshot on every evaluation so that a
/// reloaded config takes effect without restarting the engine.
pub trait ConfigProvider: Send + Sync {
    fn snapshot(&self) -> Arc<Config>;

    /// Bumped whenever the snapshot is replaced; views derived from the
    /// configuration are keyed on it
    fn generation(&self) -> u64 {
        0
    }
}

/// Hot-swappable configuration shared between the engine and its callers
pub struct SharedConfig {
    current: RwLock<Arc<Config>>,
    generation: AtomicU64,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn replace(&self, config: Config) {
        let mut current = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Arc::new(config);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Load, validate and swap in a config file. The old snapshot stays in
    /// place if the new file does not load or validate.
    pub fn reload_from_file(&self, path: &Path) -> anyhow::Result<()> {
        let config = Config::load_from_file(path)?;
        config.validate()?;
        self.replace(config);
        info!(operation = "config_reload", path = %path.display(), "Configuration reloaded");
        Ok(())
    }
}

impl ConfigProvider for SharedConfig {
    fn snapshot(&self) -> Arc<Config> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
