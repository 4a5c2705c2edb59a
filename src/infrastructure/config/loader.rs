use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::infrastructure::logging::redaction::{sanitize_line, sanitize_uri};

/// Project config file, relative to the working directory
pub const CONFIG_FILE: &str = "logwarden.yaml";
/// Optional local overrides, relative to the working directory
pub const LOCAL_CONFIG_FILE: &str = "logwarden.local.yaml";
/// Prefix of environment overrides; nested keys are separated by `__`
pub const ENV_PREFIX: &str = "LOGWARDEN_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Log file name cannot be empty")]
    EmptyLogFile,

    #[error("Remote sink needs uri, database and collection; missing {0}")]
    IncompleteRemoteSink(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. logwarden.yaml
    /// 3. logwarden.local.yaml (optional overrides)
    /// 4. Environment variables (LOGWARDEN_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Yaml::file(CONFIG_FILE))
                .merge(Yaml::file(LOCAL_CONFIG_FILE))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
            "Failed to extract configuration from figment",
        )
    }

    /// Load configuration from a specific file, environment still wins
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Yaml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
            &format!("Failed to load config from {}", path.display()),
        )
    }

    fn extract(figment: Figment, context: &str) -> Result<Config> {
        // figment echoes offending values, which may be a credentialed uri
        let config: Config = figment
            .extract()
            .map_err(|e| anyhow::anyhow!("{}", sanitize_line(&e.to_string())))
            .context(context.to_string())?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "warning", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.logging.file_name.trim().is_empty() {
            return Err(ConfigError::EmptyLogFile);
        }

        if Path::new(&config.logging.file_name).components().count() != 1 {
            return Err(ConfigError::ValidationFailed(format!(
                "log file name '{}' must not contain a directory",
                config.logging.file_name
            )));
        }

        if config.remote.is_partial() {
            let missing: Vec<&str> = [
                ("uri", &config.remote.uri),
                ("database", &config.remote.database),
                ("collection", &config.remote.collection),
            ]
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
            .map(|(name, _)| name)
            .collect();
            return Err(ConfigError::IncompleteRemoteSink(missing.join(", ")));
        }

        if let Some(uri) = config.remote.uri.as_deref().filter(|u| !u.is_empty()) {
            if reqwest::Url::parse(uri).is_err() {
                return Err(ConfigError::ValidationFailed(format!(
                    "remote uri {} is not a valid URL",
                    sanitize_uri(uri)
                )));
            }
        }

        Ok(())
    }
}
