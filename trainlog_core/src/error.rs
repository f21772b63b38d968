//! Error types for the trainlog_core library.
//!
//! Engine operations never return these: timers and the weekly log recover
//! locally. They surface only from file-facing helpers (config, plan, journal,
//! rollup) and from an explicit `Engine::flush`.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for trainlog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Plan validation error
    #[error("Plan error: {0}")]
    Plan(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
