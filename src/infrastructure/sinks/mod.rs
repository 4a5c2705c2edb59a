//! Remote record sink adapters

pub mod http;

pub use http::{HttpRecordSink, REMOTE_SINK_TARGET};
