//! Vendor GPU library backend (Tier B).
//!
//! Values come straight from the vendor API and need no classification.
//! Each metric is read on its own so one unsupported query never hides
//! the others.

use crate::core::telemetry::classifier::is_sane;
use crate::core::telemetry::feed::{
    BackendStatus, DeviceNames, FeedError, FeedResult, TelemetryFeed, BACKEND_NVML,
};
use crate::core::telemetry::reading::{Category, ClassifiedReadings};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuMemory {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

/// Per-metric queries on one GPU.
pub trait GpuDevice {
    fn name(&self) -> FeedResult<String>;
    fn temperature_celsius(&self) -> FeedResult<u32>;
    fn utilization_percent(&self) -> FeedResult<u32>;
    fn memory(&self) -> FeedResult<GpuMemory>;
    fn graphics_clock_mhz(&self) -> FeedResult<u32>;
    fn fan_speed_percent(&self) -> FeedResult<u32>;
    fn power_milliwatts(&self) -> FeedResult<u32>;
}

/// An initialized vendor library. Dropping or shutting it down releases
/// the library; `shutdown` consumes it so it can only happen once.
pub trait GpuApi {
    /// The first device (index 0)
    fn primary_device(&self) -> FeedResult<Box<dyn GpuDevice + '_>>;
    fn shutdown(self) -> FeedResult<()>;
}

pub struct VendorGpuFeed<A: GpuApi> {
    api: Option<A>,
    names: DeviceNames,
}

impl<A: GpuApi> VendorGpuFeed<A> {
    pub fn new(api: A) -> Self {
        let gpu = api
            .primary_device()
            .and_then(|device| device.name())
            .inspect_err(|e| log::debug!("GPU name query failed: {}", e))
            .ok();
        if let Some(name) = &gpu {
            log::info!("Vendor GPU library attached to {}", name);
        }
        Self {
            api: Some(api),
            names: DeviceNames { cpu: None, gpu },
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.api.is_some()
    }
}

/// Store `value` if it is usable. Vendor values are trusted except for
/// the temperature range; zero is a legitimate idle reading.
fn accept(out: &mut ClassifiedReadings, category: Category, value: FeedResult<f64>) {
    match value {
        Ok(v) if category.is_temperature() && !is_sane(category, v) => {
            log::debug!("Dropping out-of-range {:?} = {}", category, v)
        }
        Ok(v) if v.is_finite() && v >= 0.0 => out.set(category, v),
        Ok(v) => log::debug!("Dropping invalid {:?} = {}", category, v),
        Err(e) => log::debug!("{:?} unavailable: {}", category, e),
    }
}

pub fn read_device(device: &dyn GpuDevice) -> ClassifiedReadings {
    let mut out = ClassifiedReadings::new();

    accept(&mut out, Category::GpuTemp, device.temperature_celsius().map(f64::from));
    accept(&mut out, Category::GpuUsage, device.utilization_percent().map(f64::from));
    match device.memory() {
        Ok(memory) => {
            accept(&mut out, Category::GpuMemUsed, Ok(memory.used_bytes as f64 / BYTES_PER_GIB));
            accept(&mut out, Category::GpuMemTotal, Ok(memory.total_bytes as f64 / BYTES_PER_GIB));
        }
        Err(e) => log::debug!("GPU memory unavailable: {}", e),
    }
    accept(&mut out, Category::GpuClock, device.graphics_clock_mhz().map(f64::from));
    accept(&mut out, Category::GpuFanPercent, device.fan_speed_percent().map(f64::from));
    accept(
        &mut out,
        Category::GpuPower,
        device.power_milliwatts().map(|mw| f64::from(mw) / 1000.0),
    );

    out
}

impl<A: GpuApi> TelemetryFeed for VendorGpuFeed<A> {
    fn name(&self) -> &'static str {
        "vendor-gpu"
    }

    fn record_status(&self, status: &mut BackendStatus) {
        status.record(BACKEND_NVML, self.is_initialized());
    }

    fn read(&mut self) -> FeedResult<ClassifiedReadings> {
        let api = self
            .api
            .as_ref()
            .ok_or_else(|| FeedError::unavailable("vendor GPU library shut down"))?;
        let device = api.primary_device()?;
        Ok(read_device(&*device))
    }

    fn device_names(&self) -> DeviceNames {
        self.names.clone()
    }

    fn shutdown(&mut self) {
        if let Some(api) = self.api.take() {
            match api.shutdown() {
                Ok(()) => log::debug!("Vendor GPU library shut down"),
                Err(e) => log::warn!("Vendor GPU library shutdown failed: {}", e),
            }
        }
    }
}
