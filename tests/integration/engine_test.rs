use std::cell::Cell;
use std::rc::Rc;

use hwpulse::core::telemetry::feed::{
    DeviceNames, NoopFeed, TelemetryFeed, BACKEND_HWINFO, BACKEND_NVML, BACKEND_OHM_LHM,
    BACKEND_WMI,
};
use hwpulse::core::telemetry::reading::Category;
use hwpulse::core::telemetry::shared_memory::SharedMemoryFeed;
use hwpulse::core::telemetry::TelemetryEngine;

use super::support::*;

fn engine(
    instrumentation: impl TelemetryFeed + 'static,
    vendor_gpu: impl TelemetryFeed + 'static,
    shared_memory: impl TelemetryFeed + 'static,
) -> TelemetryEngine {
    TelemetryEngine::new(
        Box::new(instrumentation),
        Box::new(vendor_gpu),
        Box::new(shared_memory),
        Box::new(FixedCounters),
    )
}

#[test]
fn test_vendor_gpu_overrides_instrumentation() {
    let mut engine = engine(
        StubFeed::with("a", BACKEND_WMI, &[(Category::GpuTemp, 70.0)]),
        StubFeed::with("b", BACKEND_NVML, &[(Category::GpuTemp, 65.0)]),
        StubFeed::with("c", BACKEND_HWINFO, &[]),
    );
    assert_eq!(engine.get_stats().gpu_temp, Some(65.0));
}

#[test]
fn test_shared_memory_never_overrides() {
    let mut engine = engine(
        StubFeed::with("a", BACKEND_WMI, &[(Category::CpuClock, 4200.0)]),
        StubFeed::failing("b", BACKEND_NVML),
        StubFeed::with("c", BACKEND_HWINFO, &[(Category::CpuClock, 3900.0)]),
    );
    assert_eq!(engine.get_stats().cpu_clock, Some(4200.0));
}

#[test]
fn test_shared_memory_fills_missing_fan() {
    let mut engine = engine(
        StubFeed::with("a", BACKEND_WMI, &[(Category::CpuTemp, 50.0)]),
        StubFeed::with("b", BACKEND_NVML, &[(Category::GpuTemp, 60.0)]),
        StubFeed::with("c", BACKEND_HWINFO, &[(Category::CpuFan, 1200.0)]),
    );
    assert_eq!(engine.get_stats().cpu_fan_rpm, Some(1200));
}

#[test]
fn test_instrumentation_with_os_counters_only() {
    let mut engine = engine(
        StubFeed::with("a", BACKEND_WMI, &[(Category::CpuTemp, 55.0)]),
        NoopFeed::new("b", &[BACKEND_NVML]),
        NoopFeed::new("c", &[BACKEND_HWINFO]),
    );
    let snapshot = engine.get_stats();

    assert_eq!(snapshot.cpu_temp, Some(55.0));
    assert_eq!(snapshot.cpu_usage_percent, 23.4);
    assert_eq!(snapshot.ram_used_bytes, RAM_USED);
    assert_eq!(snapshot.ram_total_bytes, RAM_TOTAL);
    assert!((snapshot.ram_used_gb() - 8.1).abs() < 1e-6);
    assert_eq!(snapshot.ram_total_gb(), 16.0);

    for category in Category::ALL {
        if category != Category::CpuTemp {
            assert_eq!(snapshot.get(category), None, "{:?} should be absent", category);
        }
    }
}

#[test]
fn test_partial_override_keeps_other_fields() {
    let mut engine = engine(
        StubFeed::with(
            "a",
            BACKEND_WMI,
            &[(Category::GpuTemp, 80.0), (Category::GpuClock, 1800.0)],
        ),
        StubFeed::with("b", BACKEND_NVML, &[(Category::GpuTemp, 72.0)]),
        NoopFeed::new("c", &[BACKEND_HWINFO]),
    );
    let snapshot = engine.get_stats();
    assert_eq!(snapshot.gpu_temp, Some(72.0));
    assert_eq!(snapshot.gpu_clock, Some(1800.0));
}

#[test]
fn test_every_poll_is_from_scratch() {
    let instrumentation = StubFeed::with("a", BACKEND_WMI, &[(Category::CpuTemp, 55.0)]);
    let mut engine = engine(
        instrumentation,
        NoopFeed::new("b", &[BACKEND_NVML]),
        NoopFeed::new("c", &[BACKEND_HWINFO]),
    );
    let first = engine.get_stats();
    let second = engine.get_stats();
    assert_eq!(first.cpu_temp, second.cpu_temp);
    assert_eq!(second.gpu_temp, None);
}

#[test]
fn test_status_map_has_every_backend() {
    let engine = engine(
        NoopFeed::new("a", &[BACKEND_WMI, BACKEND_OHM_LHM]),
        StubFeed::with("b", BACKEND_NVML, &[]),
        NoopFeed::new("c", &[BACKEND_HWINFO]),
    );
    let status = engine.get_status();
    assert_eq!(status.len(), 4);
    assert!(status.is_available(BACKEND_NVML));
    assert!(!status.is_available(BACKEND_WMI));
    assert!(!status.is_available(BACKEND_OHM_LHM));
    assert!(!status.is_available(BACKEND_HWINFO));
}

#[test]
fn test_device_names_fall_back_through_tiers() {
    let mut vendor = StubFeed::with("b", BACKEND_NVML, &[]);
    vendor.names = DeviceNames {
        cpu: None,
        gpu: Some("NVIDIA GeForce RTX 3080".to_string()),
    };
    let mut engine = engine(NoopFeed::new("a", &[BACKEND_WMI]), vendor, NoopFeed::new("c", &[]));

    let snapshot = engine.get_stats();
    assert_eq!(snapshot.gpu_name.as_deref(), Some("NVIDIA GeForce RTX 3080"));
    assert_eq!(snapshot.cpu_name.as_deref(), Some("Generic x86-64 CPU"));
}

#[test]
fn test_shutdown_is_idempotent() {
    let shutdowns = Rc::new(Cell::new(0));
    let mut vendor = StubFeed::with("b", BACKEND_NVML, &[(Category::GpuTemp, 60.0)]);
    vendor.shutdowns = shutdowns.clone();

    let mut engine = engine(NoopFeed::new("a", &[]), vendor, NoopFeed::new("c", &[]));
    engine.shutdown();
    engine.shutdown();
    drop(engine);
    assert_eq!(shutdowns.get(), 1);
}

#[test]
fn test_stats_after_shutdown_only_carry_counters() {
    let mut engine = engine(
        StubFeed::with("a", BACKEND_WMI, &[(Category::CpuTemp, 55.0)]),
        NoopFeed::new("b", &[]),
        NoopFeed::new("c", &[]),
    );
    engine.shutdown();
    let snapshot = engine.get_stats();
    assert_eq!(snapshot.cpu_temp, None);
    assert_eq!(snapshot.cpu_usage_percent, 23.4);
}

#[test]
fn test_shared_memory_segment_end_to_end() {
    let image = segment(
        &[
            "CPU [#0]: AMD Ryzen 9 7950X",
            "ASUS ProArt X670E-CREATOR (Nuvoton NCT6799D)",
            "GPU [#0]: NVIDIA GeForce RTX 4090",
        ],
        &[
            reading(1, 0, "CPU (Tctl/Tdie)", "°C", 74.0),
            reading(3, 1, "CPU", "RPM", 1320.0),
            reading(1, 2, "GPU Temperature", "°C", 59.0),
            reading(6, 2, "GPU Clock", "MHz", 2745.0),
        ],
    );
    let tracker = RegionTracker::default();
    let shared_memory = SharedMemoryFeed::new(ScriptedOpener::new(vec![Some(image)], tracker));

    let mut engine = engine(
        StubFeed::with("a", BACKEND_WMI, &[(Category::CpuTemp, 70.0)]),
        StubFeed::with("b", BACKEND_NVML, &[(Category::GpuTemp, 58.0)]),
        shared_memory,
    );
    let snapshot = engine.get_stats();

    assert_eq!(snapshot.cpu_temp, Some(70.0));
    assert_eq!(snapshot.gpu_temp, Some(58.0));
    assert_eq!(snapshot.gpu_clock, Some(2745.0));
    assert_eq!(snapshot.cpu_fan_rpm, Some(1320));
    assert!(engine.get_status().is_available(BACKEND_HWINFO));

    let sensors = engine.list_sensors();
    assert_eq!(sensors.len(), 4);
    assert!(sensors.iter().all(|s| s.backend == "shared-memory"));
}
