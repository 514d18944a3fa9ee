// hwpulse Library - Public API

// Re-export error types
pub mod error;
pub use error::{Result, TelemetryError};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use crate::core::config::MonitorConfig;
pub use crate::core::telemetry::{BackendStatus, Snapshot, TelemetryEngine, TelemetryRuntime};

// Initialize logging
pub fn init_logging() {
    init_logging_with_level(log::LevelFilter::Info);
}

/// Initialize logging with a default level; `RUST_LOG` still wins.
pub fn init_logging_with_level(level: log::LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .parse_default_env()
        .init();
}
