// Platform-specific backends and backend selection

pub mod nvidia_nvml;
pub mod shared_memory;
pub mod wmi_sensors;

use crate::core::config::MonitorConfig;
use crate::core::telemetry::feed::{
    NoopFeed, TelemetryFeed, BACKEND_HWINFO, BACKEND_NVML, BACKEND_OHM_LHM, BACKEND_WMI,
};
use crate::core::telemetry::instrumentation::{probe_namespaces, InstrumentationFeed};
use crate::core::telemetry::shared_memory::SharedMemoryFeed;

pub use shared_memory::NamedMappingOpener;

/// Tier A: OS management connection plus the first sensor namespace that
/// has data.
pub fn instrumentation_feed(config: &MonitorConfig) -> Box<dyn TelemetryFeed> {
    let noop = || -> Box<dyn TelemetryFeed> {
        Box::new(NoopFeed::new("instrumentation", &[BACKEND_WMI, BACKEND_OHM_LHM]))
    };
    if !config.enable_instrumentation {
        log::info!("Instrumentation backend disabled by configuration");
        return noop();
    }

    let management = match wmi_sensors::connect_management() {
        Ok(management) => management,
        Err(e) => {
            log::info!("Instrumentation backend unavailable: {}", e);
            return noop();
        }
    };
    let namespace = probe_namespaces(&config.instrumentation_namespaces, wmi_sensors::open_namespace);
    if namespace.is_none() {
        log::info!("No hardware-monitoring sensor namespace found");
    }
    Box::new(InstrumentationFeed::new(Some(management), namespace))
}

/// Tier B: vendor GPU library.
pub fn vendor_gpu_feed(config: &MonitorConfig) -> Box<dyn TelemetryFeed> {
    if !config.enable_vendor_gpu {
        log::info!("Vendor GPU backend disabled by configuration");
        return Box::new(NoopFeed::new("vendor-gpu", &[BACKEND_NVML]));
    }
    nvml_feed()
}

#[cfg(feature = "nvml")]
fn nvml_feed() -> Box<dyn TelemetryFeed> {
    use crate::core::telemetry::vendor_gpu::VendorGpuFeed;

    match nvidia_nvml::NvmlApi::init() {
        Ok(api) => Box::new(VendorGpuFeed::new(api)),
        Err(e) => {
            log::info!("Vendor GPU backend unavailable: {}", e);
            Box::new(NoopFeed::new("vendor-gpu", &[BACKEND_NVML]))
        }
    }
}

#[cfg(not(feature = "nvml"))]
fn nvml_feed() -> Box<dyn TelemetryFeed> {
    log::info!("Vendor GPU backend not compiled in (feature \"nvml\")");
    Box::new(NoopFeed::new("vendor-gpu", &[BACKEND_NVML]))
}

/// Tier C: shared-memory producer. Kept even when the producer is not
/// running yet since it is retried on every poll.
pub fn shared_memory_feed(config: &MonitorConfig) -> Box<dyn TelemetryFeed> {
    if !config.enable_shared_memory {
        log::info!("Shared-memory backend disabled by configuration");
        return Box::new(NoopFeed::new("shared-memory", &[BACKEND_HWINFO]));
    }
    Box::new(SharedMemoryFeed::new(NamedMappingOpener::new(
        config.shared_memory_name.clone(),
    )))
}
