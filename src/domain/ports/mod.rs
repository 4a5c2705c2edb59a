//! Port trait definitions
//!
//! Interfaces the logging core consumes from outer adapters:
//! - RecordSink: remote append-only store for sanitized records

pub mod record_sink;

pub use record_sink::{RecordSink, SinkError};
