// src/models/mod.rs

//! Domain models for the feed tailer.

mod config;
mod measurement;
mod record;

// Re-export all public types
pub use config::{Config, FetchConfig, OutputConfig};
pub use measurement::{FieldValue, Measurement, Precision};
pub use record::{KpRecord, Status};
