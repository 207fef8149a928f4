use super::sync_ui::SyncSpinner;
use crate::output::Output;
use color_eyre::Result;
use media_retention_config::{Config, PathManager, SharedConfig};
use media_retention_core::{EngineError, ExclusionStore, JobLedger, SyncEngine, TtlCache};
use media_retention_models::Job;
use media_retention_sources::SourceFactory;
use std::sync::Arc;
use std::time::Duration;

const CACHE_TTL: Duration = Duration::from_secs(300);

/// Load and validate the config file from its standard location
pub fn load_config(path_manager: &PathManager) -> Result<Config> {
    let config_file = path_manager.config_file();
    if !config_file.exists() {
        return Err(color_eyre::eyre::eyre!(
            "Configuration file not found at {}. Run 'prunarr config init' to create one.",
            config_file.display()
        ));
    }

    let config = Config::load_from_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Configuration validation failed: {}", e))?;
    Ok(config)
}

/// Everything a command needs to drive the engine
pub struct AppContext {
    pub path_manager: PathManager,
    pub config: Arc<SharedConfig>,
    pub engine: Arc<SyncEngine>,
}

impl AppContext {
    /// Wire the engine from the config file; `force_dry_run` overrides
    /// `app.dry_run` for this process only
    pub fn open(force_dry_run: bool) -> Result<Self> {
        let path_manager = PathManager::default();
        let mut config = load_config(&path_manager)?;
        if force_dry_run {
            config.app.dry_run = true;
        }
        path_manager
            .ensure_directories()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create data directories: {}", e))?;

        let sources = SourceFactory::create_all_sources(&config);
        let exclusions = ExclusionStore::load(&path_manager.exclusions_file())?;
        let jobs = JobLedger::load(&path_manager.jobs_file(), config.app.max_jobs)?;
        let config = Arc::new(SharedConfig::new(config));

        let engine = SyncEngine::new(
            config.clone(),
            sources,
            Arc::new(exclusions),
            Arc::new(jobs),
            Arc::new(TtlCache::new(CACHE_TTL)),
        );

        Ok(Self {
            path_manager,
            config,
            engine: Arc::new(engine),
        })
    }

    /// Run one full reconciliation behind a spinner so the library is
    /// populated for the command that follows
    pub async fn load_library(&self, output: &Output) -> Result<Job> {
        let spinner = SyncSpinner::start(output.is_interactive_human(), "Reconciling media library...");
        match self.engine.full_reconciliation().await {
            Ok(job) => {
                let items = self.engine.get_media_count().await;
                spinner.finish(format!("Loaded {} items", items));
                Ok(job)
            }
            Err(e) => {
                spinner.abandon("Reconciliation failed");
                Err(reconciliation_error(e))
            }
        }
    }
}

pub fn reconciliation_error(e: EngineError) -> color_eyre::Report {
    match e {
        EngineError::ReconciliationInProgress => {
            color_eyre::eyre::eyre!("Another reconciliation is already running")
        }
        other => color_eyre::eyre::eyre!("Reconciliation failed: {}", other),
    }
}
