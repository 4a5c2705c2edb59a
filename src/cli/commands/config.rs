//! Implementation of the `logwarden config` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::logging::redaction::sanitize_uri;

#[derive(Args, Debug)]
pub struct ConfigArgs {}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    #[serde(flatten)]
    pub config: Config,
    pub remote_enabled: bool,
}

impl ConfigOutput {
    /// Wrap `config` for display with the remote uri masked.
    pub fn new(mut config: Config) -> Self {
        let remote_enabled = config.remote.target().is_some();
        config.remote.uri = config.remote.uri.as_deref().map(sanitize_uri);
        Self {
            config,
            remote_enabled,
        }
    }
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(self).unwrap_or_default()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(_args: ConfigArgs, config: Config, json_mode: bool) -> Result<()> {
    output(&ConfigOutput::new(config), json_mode);
    Ok(())
}
