use thiserror::Error;

use crate::domain::models::LogRecord;

/// Errors raised by remote record sinks.
///
/// Messages may embed the connection URI; callers run them through the
/// redactor before logging.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Invalid sink URI: {0}")]
    InvalidUri(String),

    #[error("Missing sink identifier: {0}")]
    MissingIdentifier(&'static str),

    #[error("Remote sink requires a running tokio runtime")]
    NoRuntime,

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Remote sink is closed")]
    Closed,
}

/// Append-only destination for already-sanitized records.
///
/// `append` must not block the logging call path.
pub trait RecordSink: Send + Sync {
    fn append(&self, record: LogRecord) -> Result<(), SinkError>;
}
