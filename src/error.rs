// src/error.rs

//! Unified error handling for the feed tailer.

use std::fmt;

use thiserror::Error;

/// Result type alias for kptail operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Feed content did not match the expected schema
    #[error("Format error in line '{line}': {message}")]
    Format { line: String, message: String },

    /// A record could not be rendered as line protocol
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Create a format error carrying the offending line.
    pub fn format(line: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Format {
            line: line.into(),
            message: message.to_string(),
        }
    }

    /// Create an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
