//! Error types for the fasting_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fasting_core operations
///
/// The planning engine itself is total; these errors only surface when
/// parsing outside input, touching the filesystem or exporting.
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

    /// Planner settings rejected before expansion
    #[error("Invalid plan settings: {0}")]
    InvalidSettings(String),

    /// Day key not in `YYYY-MM-DD` form
    #[error("Invalid day key: {0}")]
    InvalidDayKey(String),

    /// Clock time not in `HH:MM` form
    #[error("Invalid start time: {0}")]
    InvalidTime(String),

    /// Fasting length outside the supported protocol set
    #[error("Unsupported protocol: {0}h (expected one of 12, 16, 24, 36, 48, 72)")]
    InvalidProtocol(u32),

    /// Feeling record out of range
    #[error("Invalid feeling record: {0}")]
    InvalidFeeling(String),

    /// No fasting entries in the requested range
    #[error("Nothing to export")]
    NothingToExport,

    /// Generic error
    #[error("{0}")]
    Other(String),
}
