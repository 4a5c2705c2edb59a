pub mod config;
pub mod record;

pub use config::{
    CleanupTime, CleanupTimeError, Config, LoggingConfig, RemoteSinkConfig, RetentionConfig,
};
pub use record::{LogRecord, Severity};
