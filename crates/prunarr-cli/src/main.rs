use clap::{ArgAction, Parser, Subcommand};
use commands::{candidates, config, daemon, exclude, jobs, leaving_soon, sync};
use media_retention_config::{PathManager, MAX_LEAVING_SOON_DAYS};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "prunarr")]
#[command(about = "Prunarr - Retention rules and cleanup for your media library")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation against the configured sources
    #[command(long_about = "Ingest the catalogs, match watch history and requests, apply exclusions and retention rules, and delete due items when deletion is enabled and dry-run is off.")]
    Sync {
        /// Refresh watch history only (a full pass runs first to load the library)
        #[arg(long, action = ArgAction::SetTrue)]
        incremental: bool,

        /// Force dry-run for this run regardless of configuration
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// Run as a daemon with periodic full and incremental reconciliation
    #[command(long_about = "Start the reconciliation timers and keep running until interrupted. SIGHUP reloads the configuration file on Unix.")]
    Daemon {
        /// Skip the full reconciliation normally launched at startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,

        /// Write logs to the daily-rotated log file instead of stderr
        #[arg(long, action = ArgAction::SetTrue)]
        log_file: bool,
    },
    /// Show items that are due for deletion now
    Candidates {
        /// Also export the candidates to a CSV file
        #[arg(long, value_name = "FILE")]
        csv: Option<std::path::PathBuf>,
    },
    /// Show items scheduled for deletion within the next few days
    LeavingSoon {
        /// Look-ahead window in days (defaults to app.leaving_soon_days)
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(..=i64::from(MAX_LEAVING_SOON_DAYS)))]
        days: Option<u32>,
    },
    /// Manage items protected from deletion
    Exclude {
        #[command(subcommand)]
        cmd: ExcludeCommands,
    },
    /// Show recent reconciliation runs
    Jobs {
        /// Number of jobs to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum ExcludeCommands {
    /// Protect an item (by its id, e.g. radarr-42) from deletion
    Add {
        id: String,

        /// Why the item is kept
        #[arg(long, default_value = "")]
        reason: String,

        /// Who is excluding the item (defaults to $USER)
        #[arg(long)]
        by: Option<String>,
    },
    /// Lift an exclusion
    Remove { id: String },
    /// List all exclusions
    List,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Daemon { log_file: true, .. } => Some(PathManager::default().daemon_log_file()),
        _ => None,
    };
    logging::init_logging(cli.verbose, cli.quiet, log_file).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync { incremental, dry_run } => sync::run_sync(incremental, dry_run, &output).await,
        Commands::Daemon { no_startup_sync, .. } => daemon::run_daemon(no_startup_sync, &output).await,
        Commands::Candidates { csv } => candidates::run_candidates(csv, &output).await,
        Commands::LeavingSoon { days } => leaving_soon::run_leaving_soon(days, &output).await,
        Commands::Exclude { cmd } => exclude::run_exclude(cmd, &output).await,
        Commands::Jobs { limit } => jobs::run_jobs(limit, &output),
        Commands::Config { cmd } => config::run_config(cmd.unwrap_or(ConfigCommands::Show), &output),
    }
}
