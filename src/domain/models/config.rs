use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main configuration structure for Logwarden
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Console and file logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Optional remote log sink
    #[serde(default)]
    pub remote: RemoteSinkConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Minimum level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory holding the active log file and its rotated siblings
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// Name of the active log file
    #[serde(default = "default_log_file")]
    pub file_name: String,

    /// Enable console output
    #[serde(default = "default_true")]
    pub enable_stdout: bool,

    /// Days to keep rotated files; zero or negative keeps them forever
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// Local time of day (`HH:MM`) for the daily retention sweep
    #[serde(default)]
    pub cleanup_time: CleanupTime,

    /// Run the daily retention sweep in the background
    #[serde(default)]
    pub auto_cleanup: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_file() -> String {
    "app.log".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_retention_days() -> i64 {
    7
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            directory: default_log_directory(),
            file_name: default_log_file(),
            enable_stdout: true,
            retention_days: default_retention_days(),
            cleanup_time: CleanupTime::default(),
            auto_cleanup: false,
        }
    }
}

impl LoggingConfig {
    /// Path of the file currently being written to.
    pub fn active_file(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    /// Retention settings derived from this logging configuration.
    pub fn retention(&self) -> RetentionConfig {
        RetentionConfig {
            directory: self.directory.clone(),
            base_filename: self.file_name.clone(),
            retention_days: self.retention_days,
            cleanup_time: self.cleanup_time,
            auto_cleanup: self.auto_cleanup,
        }
    }
}

/// Settings owned by the retention scheduler, fixed at setup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionConfig {
    pub directory: PathBuf,
    pub base_filename: String,
    pub retention_days: i64,
    pub cleanup_time: CleanupTime,
    pub auto_cleanup: bool,
}

/// Remote log sink configuration
///
/// The sink is only built when all three values are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RemoteSinkConfig {
    /// Connection URI of the remote store (may embed credentials)
    #[serde(default)]
    pub uri: Option<String>,

    /// Database identifier
    #[serde(default)]
    pub database: Option<String>,

    /// Collection identifier
    #[serde(default)]
    pub collection: Option<String>,
}

impl RemoteSinkConfig {
    /// Returns `(uri, database, collection)` when the sink is fully configured.
    pub fn target(&self) -> Option<(&str, &str, &str)> {
        let uri = self.uri.as_deref().filter(|s| !s.is_empty())?;
        let database = self.database.as_deref().filter(|s| !s.is_empty())?;
        let collection = self.collection.as_deref().filter(|s| !s.is_empty())?;
        Some((uri, database, collection))
    }

    /// True when some but not all of the values are set.
    pub fn is_partial(&self) -> bool {
        let set = [&self.uri, &self.database, &self.collection]
            .iter()
            .filter(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
            .count();
        set > 0 && set < 3
    }
}

/// Invalid `HH:MM` time of day
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid cleanup time: {0}. Expected HH:MM in 24-hour format")]
pub struct CleanupTimeError(pub String);

/// Daily time of day in 24-hour `HH:MM` form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CleanupTime(NaiveTime);

impl CleanupTime {
    /// Build from hour and minute, `None` when out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub const fn as_naive_time(self) -> NaiveTime {
        self.0
    }
}

impl Default for CleanupTime {
    fn default() -> Self {
        Self(NaiveTime::from_hms_opt(2, 0, 0).unwrap_or(NaiveTime::MIN))
    }
}

impl FromStr for CleanupTime {
    type Err = CleanupTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // chrono accepts single-digit hours, the config format does not
        if trimmed.len() != 5 {
            return Err(CleanupTimeError(s.to_string()));
        }
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .map(Self)
            .map_err(|_| CleanupTimeError(s.to_string()))
    }
}

impl TryFrom<String> for CleanupTime {
    type Error = CleanupTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CleanupTime> for String {
    fn from(value: CleanupTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CleanupTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}
