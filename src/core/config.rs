use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, TelemetryError};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "HWPULSE_CONFIG";

pub const DEFAULT_SHARED_MEMORY_NAME: &str = "Global\\HWiNFO_SENS_SM2";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub poll_interval_ms: u64,
    pub enable_instrumentation: bool,
    pub enable_vendor_gpu: bool,
    pub enable_shared_memory: bool,
    pub shared_memory_name: String,
    /// Probed in order; the first with sensors wins
    pub instrumentation_namespaces: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            enable_instrumentation: true,
            enable_vendor_gpu: true,
            enable_shared_memory: true,
            shared_memory_name: DEFAULT_SHARED_MEMORY_NAME.to_string(),
            instrumentation_namespaces: vec![
                "root\\LibreHardwareMonitor".to_string(),
                "root\\OpenHardwareMonitor".to_string(),
            ],
        }
    }
}

impl MonitorConfig {
    /// Load from the first location that applies: `explicit`, then
    /// `HWPULSE_CONFIG`, then the per-user config directory. Missing or
    /// unreadable files yield the defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = resolve_config_path(
            explicit,
            std::env::var_os(CONFIG_ENV_VAR),
            dirs::config_dir(),
        );

        match path {
            Some(path) if path.exists() => Self::from_file(&path).unwrap_or_else(|e| {
                log::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }),
            Some(path) => {
                if explicit.is_some() {
                    log::warn!("Config file {} not found, using defaults", path.display());
                }
                Self::default()
            }
            None => Self::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.enable_shared_memory && self.shared_memory_name.trim().is_empty() {
            return Err(TelemetryError::config("shared_memory_name must not be empty"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

/// Explicit path, then the env var, then `<config_dir>/hwpulse/config.json`.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    env_value: Option<OsString>,
    config_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(value));
    }
    config_dir.map(|dir| dir.join("hwpulse").join("config.json"))
}
