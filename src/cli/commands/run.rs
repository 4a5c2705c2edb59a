//! Implementation of the `logwarden run` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::logging::{LoggerImpl, RetentionScheduler};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the configured log level
    #[arg(long, short)]
    pub level: Option<String>,

    /// Run the daily retention sweep in the background
    #[arg(long)]
    pub auto_cleanup: bool,

    /// Disable console output; only the file and remote sinks receive records
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub success: bool,
    pub message: String,
    pub log_file: String,
    pub scheduler_was_running: bool,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        format!("{} (log file: {})", self.message, self.log_file)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn apply_overrides(args: &RunArgs, config: &mut Config) {
    if let Some(level) = &args.level {
        config.logging.level.clone_from(level);
    }
    if args.auto_cleanup {
        config.logging.auto_cleanup = true;
    }
    if args.quiet {
        config.logging.enable_stdout = false;
    }
}

pub async fn execute(args: RunArgs, mut config: Config, json_mode: bool) -> Result<()> {
    apply_overrides(&args, &mut config);

    let handle = LoggerImpl::init_with_fallback(&config);
    let scheduler_was_running = handle
        .scheduler()
        .is_some_and(RetentionScheduler::is_running);

    info!(
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        "logwarden running; press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("shutdown requested");
    handle.shutdown().await;

    output(
        &RunOutput {
            success: true,
            message: "Logging pipeline stopped".to_string(),
            log_file: config.logging.active_file().display().to_string(),
            scheduler_was_running,
        },
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        let args = RunArgs {
            level: Some("debug".to_string()),
            auto_cleanup: true,
            quiet: true,
        };

        apply_overrides(&args, &mut config);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.auto_cleanup);
        assert!(!config.logging.enable_stdout);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = Config::default();
        let args = RunArgs {
            level: None,
            auto_cleanup: false,
            quiet: false,
        };

        apply_overrides(&args, &mut config);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.auto_cleanup);
        assert!(config.logging.enable_stdout);
    }
}
