//! Command-line interface.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::redaction::sanitize_line;

#[derive(Parser, Debug)]
#[command(name = "logwarden")]
#[command(about = "Logwarden - redacting log pipeline with retention", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file to load instead of logwarden.yaml
    #[arg(short, long, global = true, env = "LOGWARDEN_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the logging pipeline and run until interrupted
    Run(commands::run::RunArgs),

    /// Delete rotated log files older than the retention window
    Sweep(commands::sweep::SweepArgs),

    /// Redact credentials from lines read on stdin
    Redact(commands::redact::RedactArgs),

    /// Show the effective configuration
    Config(commands::config::ConfigArgs),
}

impl Cli {
    /// Load the configuration selected by `--config`, or the default hierarchy.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(),
        }
    }
}

/// Print a failed command's error, redacted, and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let message = sanitize_line(&format!("{err:#}"));
    if json_mode {
        let body = serde_json::json!({ "success": false, "error": message });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );
    } else {
        eprintln!("Error: {message}");
    }
    std::process::exit(1);
}
