//! Domain layer for Logwarden
//!
//! Configuration models, log records and the ports implemented by sinks.

pub mod models;
pub mod ports;
