// UI and formatting module

pub mod formatters;

// Re-export commonly used items for cleaner imports
pub use formatters::{format_sensor_table, format_snapshot, format_status, PLACEHOLDER};
