//! Logwarden - redacting log pipeline with retention
//!
//! Installs a `tracing` pipeline that masks credentials in every record before
//! it reaches the console, a date-rotated log file or an optional remote sink,
//! and keeps the log directory bounded with a daily retention sweep.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): configuration and record models, sink port
//! - **Infrastructure Layer** (`infrastructure`): config loading, logging
//!   pipeline, remote sink adapters
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use logwarden::{ConfigLoader, LoggerImpl};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let handle = LoggerImpl::init_with_fallback(&config);
//!     tracing::info!(password = "hunter2", "connected"); // logged as ***
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::models::{
    CleanupTime, Config, LogRecord, LoggingConfig, RemoteSinkConfig, RetentionConfig, Severity,
};
pub use domain::ports::{RecordSink, SinkError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::logging::{
    log_with_context, sanitize_context, sanitize_error_message, sanitize_map, sanitize_uri,
    sweep, LoggerImpl, LoggingHandle, RetentionPolicy, RetentionScheduler, SanitizingFormatter,
};
