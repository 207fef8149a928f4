use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use media_retention_config::{Config, PathManager, RuleKind, SourceEntry};
use owo_colors::OwoColorize;
use serde_json::json;

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(output),
        ConfigCommands::Init { force } => init_config(force, output),
    }
}

fn show_config(output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'prunarr config init' to create one with default settings.");
        return Ok(());
    }

    let config = Config::load_from_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let validation = config.validate().err().map(|e| e.to_string());

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            let mut info_table = Table::new();
            info_table.set_header(vec![
                Cell::new("Config File").add_attribute(comfy_table::Attribute::Bold),
                Cell::new(config_file.display().to_string()),
            ]);
            info_table.add_row(vec![
                Cell::new("Data Directory"),
                Cell::new(path_manager.data_dir().display().to_string()),
            ]);
            print_table(info_table);

            print_table(section("Application", vec![
                ("Dry Run", yes_no(config.app.dry_run)),
                ("Deletion Enabled", yes_no(config.app.enable_deletion)),
                ("Leaving Soon Window", format!("{} days", config.app.leaving_soon_days)),
                ("Job History", format!("{} runs", config.app.max_jobs)),
            ]));

            print_table(section("Schedule", vec![
                ("Full Reconciliation", format!("every {} min", config.sync.full_interval_minutes)),
                ("Watch History Refresh", format!("every {} min", config.sync.incremental_interval_minutes)),
                ("Reconcile on Start", yes_no(config.sync.auto_start)),
            ]));

            print_table(section("Retention", vec![
                ("Movies", config.rules.movie_retention.clone()),
                ("TV Shows", config.rules.tv_retention.clone()),
            ]));

            if config.advanced_rules.is_empty() {
                println!("{}", "Advanced rules: none".bright_black());
                println!();
            } else {
                let rows = config
                    .advanced_rules
                    .iter()
                    .map(|rule| {
                        let detail = match rule.kind {
                            RuleKind::Tag => format!("tag '{}'", rule.tag.as_deref().unwrap_or_default()),
                            RuleKind::User => format!("{} user(s)", rule.users.len()),
                            RuleKind::Watched => "watched items".to_string(),
                        };
                        (
                            rule.name.as_str(),
                            format!(
                                "{} {} {}{}",
                                yes_no(rule.enabled),
                                detail,
                                rule.retention.as_deref().unwrap_or("per user"),
                                if rule.require_watched { " (after watch)" } else { "" }
                            ),
                        )
                    })
                    .collect();
                print_table(section("Advanced Rules", rows));
            }

            let sources: Vec<(&str, String)> = config
                .sources
                .entries()
                .into_iter()
                .map(|(key, entry)| (key, describe_source(key, entry)))
                .collect();
            if sources.is_empty() {
                println!("{}", "Sources: none configured".bright_black());
                println!();
            } else {
                print_table(section("Sources", sources));
            }

            match &validation {
                Some(e) => output.warn(format!("Configuration is invalid: {}", e)),
                None => output.success("Configuration is valid"),
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "valid": validation.is_none(),
                "validation_error": validation,
                "config": config,
            }));
        }
    }

    Ok(())
}

fn init_config(force: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;

    let config_file = path_manager.config_file();
    if config_file.exists() && !force {
        output.warn(format!("Configuration already exists at {}", config_file.display()));
        output.info("Use --force to overwrite it.");
        return Ok(());
    }

    let config = default_config(&path_manager);
    config
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    match output.format() {
        OutputFormat::Human => {
            output.success(format!("Configuration written to {}", config_file.display()));
            output.info("Sources are disabled until you point them at your export files and enable them.");
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({ "config_file": config_file.display().to_string(), "created": true }));
        }
    }
    Ok(())
}

/// Defaults plus disabled source entries pointing into the data directory
fn default_config(path_manager: &PathManager) -> Config {
    let snapshots = path_manager.data_dir().join("snapshots");
    let entry = |file: &str| {
        Some(SourceEntry {
            enabled: false,
            name: None,
            path: snapshots.join(file),
        })
    };

    let mut config = Config::default();
    config.sources.movie_catalog = entry("movies.json");
    config.sources.tv_catalog = entry("series.json");
    config.sources.watch_history = entry("watch_history.json");
    config.sources.watch_history_secondary = entry("watch_history_secondary.json");
    config.sources.requests = entry("requests.json");
    config
}

fn describe_source(key: &str, entry: &SourceEntry) -> String {
    let status = if entry.enabled { "✓".green().to_string() } else { "✗".red().to_string() };
    format!("{} {} ({})", status, entry.name_or(key), entry.path.display())
}

fn section(title: &str, rows: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new(title).fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
    ]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    table
}

fn print_table(mut table: Table) {
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", table);
    println!();
}

fn yes_no(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}
