use media_retention_models::MediaType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted reconciliation interval (one year)
pub const MAX_INTERVAL_MINUTES: u64 = 365 * 24 * 60;

/// Longest accepted leaving-soon look-ahead
pub const MAX_LEAVING_SOON_DAYS: u32 = 3650;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub rules: RetentionRules,
    #[serde(default)]
    pub sources: SourceConfig,
    #[serde(default)]
    pub advanced_rules: Vec<AdvancedRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Simulation mode: candidates are computed and logged, nothing is deleted
    #[serde(default = "default_true")]
    pub dry_run: bool,
    #[serde(default)]
    pub enable_deletion: bool,
    #[serde(default = "default_leaving_soon_days")]
    pub leaving_soon_days: u32,
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_full_interval_minutes")]
    pub full_interval_minutes: u64,
    #[serde(default = "default_incremental_interval_minutes")]
    pub incremental_interval_minutes: u64,
    #[serde(default = "default_true")]
    pub auto_start: bool,
}

/// Standard per-type retention, e.g. "90d", "36h" or "never"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionRules {
    #[serde(default = "default_movie_retention")]
    pub movie_retention: String,
    #[serde(default = "default_tv_retention")]
    pub tv_retention: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdvancedRule {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention: Option<String>,
    #[serde(default)]
    pub require_watched: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<UserRule>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Tag,
    User,
    Watched,
}

/// Per-requester retention inside a `user` rule
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub retention: String,
    #[serde(default)]
    pub require_watched: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_catalog: Option<SourceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tv_catalog: Option<SourceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_history: Option<SourceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_history_secondary: Option<SourceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<SourceEntry>,
}

/// A snapshot-backed collaborator: a JSON export file on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Name used in logs and in the source-qualified ids of catalog items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub path: PathBuf,
}

/// Fallback name of the movie catalog when its entry sets none
pub const MOVIE_CATALOG_NAME: &str = "movie-catalog";

/// Fallback name of the TV catalog when its entry sets none
pub const TV_CATALOG_NAME: &str = "tv-catalog";

impl SourceEntry {
    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(fallback)
    }
}

fn default_true() -> bool {
    true
}

fn default_leaving_soon_days() -> u32 {
    14
}

fn default_max_jobs() -> usize {
    50
}

fn default_full_interval_minutes() -> u64 {
    60
}

fn default_incremental_interval_minutes() -> u64 {
    15
}

fn default_movie_retention() -> String {
    "90d".to_string()
}

fn default_tv_retention() -> String {
    "120d".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dry_run: default_true(),
            enable_deletion: false,
            leaving_soon_days: default_leaving_soon_days(),
            max_jobs: default_max_jobs(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            full_interval_minutes: default_full_interval_minutes(),
            incremental_interval_minutes: default_incremental_interval_minutes(),
            auto_start: default_true(),
        }
    }
}

impl SyncConfig {
    /// Clamped to `1..=MAX_INTERVAL_MINUTES` so timers can always be armed
    pub fn full_interval(&self) -> Duration {
        minutes(self.full_interval_minutes)
    }

    pub fn incremental_interval(&self) -> Duration {
        minutes(self.incremental_interval_minutes)
    }
}

fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.clamp(1, MAX_INTERVAL_MINUTES) * 60)
}

impl Default for RetentionRules {
    fn default() -> Self {
        Self {
            movie_retention: default_movie_retention(),
            tv_retention: default_tv_retention(),
        }
    }
}

impl RetentionRules {
    pub fn retention_for(&self, media_type: MediaType) -> &str {
        match media_type {
            MediaType::Movie => &self.movie_retention,
            MediaType::Show => &self.tv_retention,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Structural checks only. Retention strings are not checked here: the
    /// rules engine treats an unparsable retention as "no deletion scheduled".
    pub fn validate(&self) -> anyhow::Result<()> {
        let intervals = [
            ("full_interval_minutes", self.sync.full_interval_minutes),
            ("incremental_interval_minutes", self.sync.incremental_interval_minutes),
        ];
        for (key, value) in intervals {
            if value == 0 || value > MAX_INTERVAL_MINUTES {
                return Err(anyhow::anyhow!(
                    "sync.{} must be between 1 and {}",
                    key,
                    MAX_INTERVAL_MINUTES
                ));
            }
        }
        if self.app.leaving_soon_days > MAX_LEAVING_SOON_DAYS {
            return Err(anyhow::anyhow!(
                "app.leaving_soon_days must be at most {}",
                MAX_LEAVING_SOON_DAYS
            ));
        }
        if self.app.max_jobs == 0 {
            return Err(anyhow::anyhow!("app.max_jobs must be greater than zero"));
        }

        for rule in &self.advanced_rules {
            if rule.name.trim().is_empty() {
                return Err(anyhow::anyhow!("Advanced rules must have a name"));
            }
            match rule.kind {
                RuleKind::Tag => {
                    if rule.tag.as_deref().map_or(true, |t| t.trim().is_empty()) {
                        return Err(anyhow::anyhow!("Tag rule '{}' has no tag", rule.name));
                    }
                    if rule.retention.is_none() {
                        return Err(anyhow::anyhow!("Tag rule '{}' has no retention", rule.name));
                    }
                }
                RuleKind::User => {
                    if rule.users.is_empty() {
                        return Err(anyhow::anyhow!("User rule '{}' has no users", rule.name));
                    }
                    for user in &rule.users {
                        if user.user_id.is_none() && user.username.is_none() && user.email.is_none() {
                            return Err(anyhow::anyhow!(
                                "User rule '{}' has an entry without user_id, username or email",
                                rule.name
                            ));
                        }
                    }
                }
                RuleKind::Watched => {
                    if rule.retention.is_none() {
                        return Err(anyhow::anyhow!("Watched rule '{}' has no retention", rule.name));
                    }
                }
            }
        }

        for (key, entry) in self.sources.entries() {
            if entry.enabled && entry.path.as_os_str().is_empty() {
                return Err(anyhow::anyhow!("sources.{} is enabled but has no path", key));
            }
        }

        // Catalog names prefix item ids, so movie and TV ids must not share one
        if let (Some(movies), Some(shows)) = (&self.sources.movie_catalog, &self.sources.tv_catalog) {
            let movie_name = movies.name_or(MOVIE_CATALOG_NAME);
            if movies.enabled && shows.enabled && movie_name == shows.name_or(TV_CATALOG_NAME) {
                return Err(anyhow::anyhow!(
                    "sources.movie_catalog and sources.tv_catalog must have different names (both are '{}')",
                    movie_name
                ));
            }
        }

        Ok(())
    }

    /// Get list of configured and enabled sources
    pub fn get_configured_sources(&self) -> Vec<String> {
        self.sources
            .entries()
            .into_iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(key, _)| key.to_string())
            .collect()
    }
}

impl SourceConfig {
    /// All configured entries in ingest order, keyed by their config name
    pub fn entries(&self) -> Vec<(&'static str, &SourceEntry)> {
        [
            ("movie_catalog", self.movie_catalog.as_ref()),
            ("tv_catalog", self.tv_catalog.as_ref()),
            ("watch_history", self.watch_history.as_ref()),
            ("watch_history_secondary", self.watch_history_secondary.as_ref()),
            ("requests", self.requests.as_ref()),
        ]
        .into_iter()
        .filter_map(|(key, entry)| entry.map(|e| (key, e)))
        .collect()
    }
}
