// Command handlers module
pub mod sensors;
pub mod status;
pub mod watch;

// Re-exports for cleaner imports
pub use sensors::execute as sensors;
pub use status::execute as status;
pub use watch::execute as watch;
