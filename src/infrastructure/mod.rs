//! Infrastructure layer module
//!
//! Adapters behind the domain types:
//! - Configuration management (figment)
//! - Logging pipeline (tracing)
//! - Remote record sinks
//!
//! Sink implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod logging;
pub mod sinks;
