//! Implementation of the `logwarden sweep` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::logging::rotation::{RetentionPolicy, SweepReport};

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Log directory (defaults to the configured one)
    #[arg(long, short)]
    pub directory: Option<PathBuf>,

    /// Active log file name (defaults to the configured one)
    #[arg(long)]
    pub file_name: Option<String>,

    /// Retention window in days; zero or negative keeps everything
    #[arg(long, short, allow_hyphen_values = true)]
    pub retention_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FailedDeletion {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SweepOutput {
    pub directory: PathBuf,
    pub retention_days: i64,
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<FailedDeletion>,
}

impl SweepOutput {
    fn from_report(policy: &RetentionPolicy, report: SweepReport) -> Self {
        Self {
            directory: policy.directory().to_path_buf(),
            retention_days: policy.retention_days(),
            deleted: report.deleted,
            failed: report
                .failed
                .into_iter()
                .map(|(path, error)| FailedDeletion { path, error })
                .collect(),
        }
    }
}

impl CommandOutput for SweepOutput {
    fn to_human(&self) -> String {
        if self.retention_days <= 0 {
            return "Retention disabled (retention_days <= 0); nothing deleted.".to_string();
        }

        let mut lines = vec![format!(
            "Deleted {} rotated file(s) older than {} day(s) in {}",
            self.deleted.len(),
            self.retention_days,
            self.directory.display()
        )];
        for path in &self.deleted {
            lines.push(format!("  - {}", path.display()));
        }
        if !self.failed.is_empty() {
            lines.push(format!("\nCould not delete {} file(s):", self.failed.len()));
            for failure in &self.failed {
                lines.push(format!("  - {}: {}", failure.path.display(), failure.error));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn policy_for(args: SweepArgs, config: &Config) -> RetentionPolicy {
    RetentionPolicy::new(
        args.directory.unwrap_or_else(|| config.logging.directory.clone()),
        args.file_name.unwrap_or_else(|| config.logging.file_name.clone()),
        args.retention_days.unwrap_or(config.logging.retention_days),
    )
}

pub async fn execute(args: SweepArgs, config: Config, json_mode: bool) -> Result<()> {
    let policy = policy_for(args, &config);

    let sweep_policy = policy.clone();
    let report =
        tokio::task::spawn_blocking(move || sweep_policy.sweep_report(&sweep_policy.active_file()))
            .await?;

    output(&SweepOutput::from_report(&policy, report), json_mode);
    Ok(())
}
