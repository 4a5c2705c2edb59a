//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - Redaction of credentials in every emitted line
//! - Date-stamped file rotation with a retention sweep
//! - Daily retention scheduler
//! - Optional remote record sink

pub mod context;
pub mod formatter;
pub mod logger;
pub mod redaction;
pub mod remote;
pub mod rotation;
pub mod scheduler;
pub mod writer;

pub use context::log_with_context;
pub use formatter::SanitizingFormatter;
pub use logger::{parse_log_level, LoggerImpl, LoggingHandle};
pub use redaction::{
    sanitize_context, sanitize_error_message, sanitize_json, sanitize_line, sanitize_map,
    sanitize_uri, MASK,
};
pub use remote::RemoteSinkLayer;
pub use rotation::{sweep, FileRemover, FsRemover, RetentionPolicy, SweepReport};
pub use scheduler::{next_run_after, DailyTrigger, LocalClock, RetentionScheduler};
pub use writer::TimedRotatingWriter;
