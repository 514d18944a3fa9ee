//! Tiered merge of all telemetry backends into one [`Snapshot`].
//!
//! Per field the result is `vendor ?? instrumentation ?? shared memory`:
//! the instrumentation namespace forms the baseline, the vendor GPU library
//! overrides whatever it reports, and the shared-memory producer only fills
//! gaps. OS counters are written unconditionally.

use serde::Serialize;

use crate::core::config::MonitorConfig;
use crate::platform;

use super::counters::{CounterSource, SysinfoCounters};
use super::feed::{BackendStatus, DeviceNames, FeedResult, TelemetryFeed};
use super::reading::{ClassifiedReadings, RawSensorReading};
use super::snapshot::Snapshot;

/// Merge one poll's tier outputs. A failed tier contributes nothing.
pub fn reconcile(
    instrumentation: FeedResult<ClassifiedReadings>,
    vendor_gpu: FeedResult<ClassifiedReadings>,
    shared_memory: FeedResult<ClassifiedReadings>,
) -> ClassifiedReadings {
    let mut merged = settle("instrumentation", instrumentation);
    merged.override_with(&settle("vendor-gpu", vendor_gpu));
    merged.fill_from(&settle("shared-memory", shared_memory));
    merged
}

fn settle(tier: &str, result: FeedResult<ClassifiedReadings>) -> ClassifiedReadings {
    result.unwrap_or_else(|e| {
        log::debug!("{} tier produced nothing: {}", tier, e);
        ClassifiedReadings::new()
    })
}

/// A raw reading tagged with the backend it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcedReading {
    pub backend: &'static str,
    #[serde(flatten)]
    pub reading: RawSensorReading,
}

pub struct TelemetryEngine {
    instrumentation: Box<dyn TelemetryFeed>,
    vendor_gpu: Box<dyn TelemetryFeed>,
    shared_memory: Box<dyn TelemetryFeed>,
    counters: Box<dyn CounterSource>,
    names: DeviceNames,
    shut_down: bool,
}

impl TelemetryEngine {
    pub fn new(
        instrumentation: Box<dyn TelemetryFeed>,
        vendor_gpu: Box<dyn TelemetryFeed>,
        shared_memory: Box<dyn TelemetryFeed>,
        counters: Box<dyn CounterSource>,
    ) -> Self {
        let mut names = instrumentation.device_names();
        names.fill_from(vendor_gpu.device_names());
        names.fill_from(shared_memory.device_names());
        if names.cpu.is_none() {
            names.cpu = counters.cpu_brand();
        }

        Self {
            instrumentation,
            vendor_gpu,
            shared_memory,
            counters,
            names,
            shut_down: false,
        }
    }

    /// Bring up every backend the platform and `config` allow.
    pub fn detect(config: &MonitorConfig) -> Self {
        let engine = Self::new(
            platform::instrumentation_feed(config),
            platform::vendor_gpu_feed(config),
            platform::shared_memory_feed(config),
            Box::new(SysinfoCounters::new()),
        );
        let status = engine.get_status();
        let up: Vec<&str> = status.iter().filter(|(_, up)| *up).map(|(n, _)| n).collect();
        log::info!("Telemetry backends available: {:?}", up);
        engine
    }

    /// Poll every tier once and merge. After shutdown only OS counters
    /// are reported.
    pub fn get_stats(&mut self) -> Snapshot {
        let counters = self.counters.sample();
        if self.shut_down {
            return Snapshot::assemble(&ClassifiedReadings::new(), counters, self.names.clone());
        }

        let fields = reconcile(
            self.instrumentation.read(),
            self.vendor_gpu.read(),
            self.shared_memory.read(),
        );
        Snapshot::assemble(&fields, counters, self.names.clone())
    }

    pub fn get_status(&self) -> BackendStatus {
        let mut status = BackendStatus::new();
        for feed in self.feeds() {
            feed.record_status(&mut status);
        }
        status
    }

    pub fn device_names(&self) -> &DeviceNames {
        &self.names
    }

    /// Unclassified readings of the raw backends, for diagnostics.
    pub fn list_sensors(&mut self) -> Vec<SourcedReading> {
        if self.shut_down {
            return Vec::new();
        }
        let mut out = Vec::new();
        for feed in [&mut self.instrumentation, &mut self.shared_memory] {
            let backend = feed.name();
            match feed.raw_readings() {
                Ok(readings) => out.extend(
                    readings
                        .into_iter()
                        .map(|reading| SourcedReading { backend, reading }),
                ),
                Err(e) => log::debug!("{} sensors unavailable: {}", backend, e),
            }
        }
        out
    }

    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.shared_memory.shutdown();
        self.vendor_gpu.shutdown();
        self.instrumentation.shutdown();
        log::debug!("Telemetry engine shut down");
    }

    fn feeds(&self) -> [&dyn TelemetryFeed; 3] {
        [
            &*self.instrumentation,
            &*self.vendor_gpu,
            &*self.shared_memory,
        ]
    }
}

impl Drop for TelemetryEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
