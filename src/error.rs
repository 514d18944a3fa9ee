use std::io;
use thiserror::Error;

/// Custom error type for hwpulse
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type alias for hwpulse
pub type Result<T> = std::result::Result<T, TelemetryError>;

impl TelemetryError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        TelemetryError::Config(msg.into())
    }

    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        TelemetryError::Runtime(msg.into())
    }
}
