pub mod config;
pub mod paths;
pub mod provider;

pub use config::{
    AdvancedRule, AppConfig, Config, RetentionRules, RuleKind, SourceConfig, SourceEntry, SyncConfig, UserRule,
    MAX_INTERVAL_MINUTES, MAX_LEAVING_SOON_DAYS, MOVIE_CATALOG_NAME, TV_CATALOG_NAME,
};
pub use paths::{PathManager, BASE_PATH_ENV};
pub use provider::{ConfigProvider, SharedConfig};
