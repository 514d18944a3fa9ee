use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use super::reading::{ClassifiedReadings, RawSensorReading};

/// Status key for the instrumentation sensor namespace (LHM/OHM)
pub const BACKEND_OHM_LHM: &str = "ohm_lhm";
/// Status key for the OS management connection
pub const BACKEND_WMI: &str = "wmi";
/// Status key for the vendor GPU library
pub const BACKEND_NVML: &str = "nvml";
/// Status key for the shared-memory producer
pub const BACKEND_HWINFO: &str = "hwinfo";

/// Failure of a single backend. Never travels past the aggregation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedError {
    /// Backend never initialized (dependency missing or OS API absent)
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// This poll's read failed; the backend may recover next poll
    #[error("transient read failure: {0}")]
    TransientReadFailure(String),

    /// Malformed or undersized record; local to that record
    #[error("malformed record {index}: {reason}")]
    ParseError { index: usize, reason: String },

    /// Protocol signature mismatch; triggers a resync
    #[error("stale protocol signature {found:#010x}")]
    StaleProtocol { found: u32 },
}

pub type FeedResult<T> = std::result::Result<T, FeedError>;

impl FeedError {
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        FeedError::Unavailable(msg.into())
    }

    pub fn transient<S: Into<String>>(msg: S) -> Self {
        FeedError::TransientReadFailure(msg.into())
    }

    pub fn parse<S: Into<String>>(index: usize, reason: S) -> Self {
        FeedError::ParseError {
            index,
            reason: reason.into(),
        }
    }
}

/// Model names reported by a backend, captured once at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceNames {
    pub cpu: Option<String>,
    pub gpu: Option<String>,
}

impl DeviceNames {
    /// Keep names already present, take the missing ones from `other`.
    pub fn fill_from(&mut self, other: DeviceNames) {
        if self.cpu.is_none() {
            self.cpu = other.cpu;
        }
        if self.gpu.is_none() {
            self.gpu = other.gpu;
        }
    }
}

/// Backend name -> initialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BackendStatus(BTreeMap<String, bool>);

impl BackendStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, backend: &str, available: bool) {
        self.0.insert(backend.to_string(), available);
    }

    pub fn get(&self, backend: &str) -> Option<bool> {
        self.0.get(backend).copied()
    }

    pub fn is_available(&self, backend: &str) -> bool {
        self.get(backend).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(name, &up)| (name.as_str(), up))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One telemetry backend as seen by the aggregation engine.
///
/// The set of implementations is closed: the instrumentation namespace, the
/// vendor GPU library, the shared-memory producer, and [`NoopFeed`] for
/// any of them that could not be brought up.
pub trait TelemetryFeed {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Add this backend's availability entries to `status`
    fn record_status(&self, status: &mut BackendStatus);

    /// Classified fields for this poll
    fn read(&mut self) -> FeedResult<ClassifiedReadings>;

    /// Device names captured when the backend came up
    fn device_names(&self) -> DeviceNames {
        DeviceNames::default()
    }

    /// Unclassified readings, for diagnostics. Pre-classified backends
    /// return nothing.
    fn raw_readings(&mut self) -> FeedResult<Vec<RawSensorReading>> {
        Ok(Vec::new())
    }

    /// Release OS resources. Must be safe to call more than once.
    fn shutdown(&mut self) {}
}

/// Stand-in for a backend that is absent or disabled.
#[derive(Debug, Clone)]
pub struct NoopFeed {
    name: &'static str,
    status_keys: &'static [&'static str],
}

impl NoopFeed {
    pub fn new(name: &'static str, status_keys: &'static [&'static str]) -> Self {
        Self { name, status_keys }
    }
}

impl TelemetryFeed for NoopFeed {
    fn name(&self) -> &'static str {
        self.name
    }

    fn record_status(&self, status: &mut BackendStatus) {
        for key in self.status_keys {
            status.record(key, false);
        }
    }

    fn read(&mut self) -> FeedResult<ClassifiedReadings> {
        Err(FeedError::unavailable(format!("{} backend not initialized", self.name)))
    }
}
