use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// Spinner shown while a reconciliation runs; a no-op off a terminal
pub struct SyncSpinner {
    bar: Option<ProgressBar>,
}

impl SyncSpinner {
    pub fn start(enabled: bool, msg: &str) -> Self {
        if !enabled || !is_interactive() {
            tracing::debug!(
                operation = "ui_init",
                mode = "non_interactive",
                "Progress spinner disabled, using structured logging"
            );
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
        bar.set_style(style);
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar: Some(bar) }
    }

    pub fn finish(&self, msg: impl Into<String>) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(msg.into());
        }
    }

    pub fn abandon(&self, msg: impl Into<String>) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message(msg.into());
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
