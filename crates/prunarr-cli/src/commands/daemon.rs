use super::context::AppContext;
use crate::output::Output;
use color_eyre::Result;
use media_retention_config::ConfigProvider;
use tracing::{error, info};

/// Run the reconciliation timers until SIGINT/SIGTERM
pub async fn run_daemon(no_startup_sync: bool, output: &Output) -> Result<()> {
    let ctx = AppContext::open(false)?;

    if no_startup_sync {
        let mut config = (*ctx.config.snapshot()).clone();
        config.sync.auto_start = false;
        ctx.config.replace(config);
    }

    ctx.engine
        .start()
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to start sync engine: {}", e))?;

    let status = ctx.engine.get_status().await;
    output.success(format!(
        "Daemon started: full reconciliation every {} min, watch history every {} min",
        status.full_interval_minutes, status.incremental_interval_minutes
    ));

    wait_for_shutdown(&ctx).await?;

    ctx.engine.stop().await;
    let status = ctx.engine.get_status().await;
    info!(
        operation = "daemon_stop",
        items = status.total,
        excluded = status.excluded,
        last_full_sync = ?status.last_full_sync,
        "Daemon stopped"
    );
    output.info("Daemon stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown(ctx: &AppContext) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!(operation = "daemon_signal", signal = "SIGINT", "Shutting down");
                return Ok(());
            }
            _ = terminate.recv() => {
                info!(operation = "daemon_signal", signal = "SIGTERM", "Shutting down");
                return Ok(());
            }
            _ = hangup.recv() => reload_config(ctx),
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_ctx: &AppContext) -> Result<()> {
    tokio::signal::ctrl_c().await?;
    info!(operation = "daemon_signal", signal = "ctrl_c", "Shutting down");
    Ok(())
}

/// Swap in the config file; retention rules pick it up on the next run,
/// interval changes need a restart
#[cfg_attr(not(unix), allow(dead_code))]
fn reload_config(ctx: &AppContext) {
    let config_file = ctx.path_manager.config_file();
    if let Err(e) = ctx.config.reload_from_file(&config_file) {
        error!(
            operation = "config_reload",
            error = %e,
            "Configuration reload failed; keeping the previous configuration"
        );
    }
}
