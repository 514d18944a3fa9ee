//! NVIDIA GPU access through NVML (the library behind nvidia-smi).
//!
//! NVML must be initialized once per process user and shut down once, so
//! the handle is owned by [`NvmlApi`] instead of living in a global.

#[cfg(feature = "nvml")]
use nvml_wrapper::enum_wrappers::device::{Clock, TemperatureSensor};
#[cfg(feature = "nvml")]
use nvml_wrapper::error::NvmlError;
#[cfg(feature = "nvml")]
use nvml_wrapper::{Device, Nvml};

#[cfg(feature = "nvml")]
use crate::core::telemetry::feed::{FeedError, FeedResult};
#[cfg(feature = "nvml")]
use crate::core::telemetry::vendor_gpu::{GpuApi, GpuDevice, GpuMemory};

#[cfg(feature = "nvml")]
pub struct NvmlApi {
    nvml: Nvml,
}

#[cfg(feature = "nvml")]
impl NvmlApi {
    /// Load NVML and make sure device 0 is reachable.
    pub fn init() -> FeedResult<Self> {
        let nvml = Nvml::init().map_err(|e| {
            FeedError::unavailable(format!(
                "NVML not available (NVIDIA driver not installed or incompatible): {}",
                e
            ))
        })?;
        let count = nvml
            .device_count()
            .map_err(|e| FeedError::unavailable(format!("NVML device count failed: {}", e)))?;
        if count == 0 {
            return Err(FeedError::unavailable("NVML reports no devices"));
        }
        Ok(Self { nvml })
    }
}

#[cfg(feature = "nvml")]
fn metric<T>(what: &str, result: Result<T, NvmlError>) -> FeedResult<T> {
    result.map_err(|e| FeedError::transient(format!("{}: {}", what, e)))
}

#[cfg(feature = "nvml")]
impl GpuApi for NvmlApi {
    fn primary_device(&self) -> FeedResult<Box<dyn GpuDevice + '_>> {
        let device = metric("device 0", self.nvml.device_by_index(0))?;
        Ok(Box::new(NvmlDevice { device }))
    }

    fn shutdown(self) -> FeedResult<()> {
        self.nvml
            .shutdown()
            .map_err(|e| FeedError::transient(format!("NVML shutdown failed: {}", e)))
    }
}

#[cfg(feature = "nvml")]
struct NvmlDevice<'nvml> {
    device: Device<'nvml>,
}

#[cfg(feature = "nvml")]
impl GpuDevice for NvmlDevice<'_> {
    fn name(&self) -> FeedResult<String> {
        metric("name", self.device.name())
    }

    fn temperature_celsius(&self) -> FeedResult<u32> {
        metric("temperature", self.device.temperature(TemperatureSensor::Gpu))
    }

    fn utilization_percent(&self) -> FeedResult<u32> {
        metric("utilization", self.device.utilization_rates()).map(|u| u.gpu)
    }

    fn memory(&self) -> FeedResult<GpuMemory> {
        metric("memory", self.device.memory_info()).map(|m| GpuMemory {
            used_bytes: m.used,
            total_bytes: m.total,
        })
    }

    fn graphics_clock_mhz(&self) -> FeedResult<u32> {
        metric("graphics clock", self.device.clock_info(Clock::Graphics))
    }

    fn fan_speed_percent(&self) -> FeedResult<u32> {
        metric("fan speed", self.device.fan_speed(0))
    }

    fn power_milliwatts(&self) -> FeedResult<u32> {
        metric("power usage", self.device.power_usage())
    }
}
