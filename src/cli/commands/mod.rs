//! CLI command implementations.

pub mod config;
pub mod redact;
pub mod run;
pub mod sweep;
