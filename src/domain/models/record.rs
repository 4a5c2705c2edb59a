use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Severity of a log call, closed over the levels operators configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Map a tracing level onto the closest severity.
    pub fn from_level(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warning,
            tracing::Level::ERROR => Self::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" | "trace" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" | "fatal" => Ok(Self::Critical),
            other => Err(format!("Invalid severity: {other}")),
        }
    }
}

/// A single sanitized log event as handed to a remote sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: Severity,
    /// Logger name (the tracing target)
    pub logger: String,
    pub message: String,
    /// Fully formatted line, `<time> [<LEVEL>] <logger>: <message>`
    pub formatted: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
}

impl LogRecord {
    pub fn new(
        level: Severity,
        logger: impl Into<String>,
        message: impl Into<String>,
        context: Map<String, Value>,
    ) -> Self {
        let timestamp = Utc::now();
        let logger = logger.into();
        let message = message.into();
        let formatted = format!(
            "{} [{}] {}: {}",
            timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            level.as_str().to_uppercase(),
            logger,
            message
        );
        Self {
            id: Uuid::new_v4(),
            timestamp,
            level,
            logger,
            message,
            formatted,
            context,
        }
    }
}
