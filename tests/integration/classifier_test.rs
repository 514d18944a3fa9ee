use hwpulse::core::telemetry::classifier::classify;
use hwpulse::core::telemetry::instrumentation::{to_raw_reading, NamespaceSensor};
use hwpulse::core::telemetry::reading::{Category, SensorKind};
use hwpulse::core::telemetry::rules::{NAMESPACE_RULES, SHARED_MEMORY_RULES};

use super::support::raw;

fn namespace_sensor(parent: &str, name: &str, sensor_type: &str, value: f64) -> NamespaceSensor {
    NamespaceSensor {
        name: name.to_string(),
        sensor_type: sensor_type.to_string(),
        value: Some(value),
        parent: parent.to_string(),
    }
}

#[test]
fn test_classification_is_deterministic() {
    let readings = vec![
        raw("CPU [#0]: AMD Ryzen 7 7800X3D", "CPU (Tctl/Tdie)", SensorKind::Temperature, 68.0),
        raw("CPU [#0]: AMD Ryzen 7 7800X3D", "Core 0 Clock", SensorKind::Clock, 4950.0),
        raw("GPU [#0]: AMD Radeon RX 7900 XTX", "GPU Temperature", SensorKind::Temperature, 55.0),
        raw("GPU [#0]: AMD Radeon RX 7900 XTX", "GPU Clock", SensorKind::Clock, 2500.0),
        raw("GPU [#0]: AMD Radeon RX 7900 XTX", "GPU Fan", SensorKind::Fan, 1100.0),
    ];
    let first = classify(&readings, &SHARED_MEMORY_RULES);
    for _ in 0..10 {
        assert_eq!(classify(&readings, &SHARED_MEMORY_RULES), first);
    }
    assert_eq!(first.len(), 5);
}

#[test]
fn test_no_reading_lands_in_two_categories() {
    let readings = vec![raw(
        "GPU [#0]: NVIDIA GeForce RTX 3070",
        "GPU Core Temperature",
        SensorKind::Temperature,
        63.0,
    )];
    for table in [&SHARED_MEMORY_RULES, &NAMESPACE_RULES] {
        let classified = classify(&readings, table);
        assert_eq!(classified.len(), 1, "{}", table.name);
        assert_eq!(classified.get(Category::GpuTemp), Some(63.0));
    }
}

#[test]
fn test_namespace_amd_system() {
    let sensors = vec![
        namespace_sensor("/amdcpu/0", "Core (Tctl/Tdie)", "Temperature", 71.3),
        namespace_sensor("/amdcpu/0", "Core #1", "Clock", 4525.0),
        namespace_sensor("/gpu-amd/0", "GPU Core", "Temperature", 64.0),
        namespace_sensor("/gpu-amd/0", "GPU Core", "Clock", 2480.0),
        namespace_sensor("/gpu-amd/0", "GPU Core", "Load", 88.0),
        namespace_sensor("/gpu-amd/0", "GPU Fan", "Fan", 1400.0),
        namespace_sensor("/gpu-amd/0", "GPU Package", "Power", 245.0),
        namespace_sensor("/gpu-amd/0", "GPU Memory Used", "SmallData", 4096.0),
        namespace_sensor("/gpu-amd/0", "GPU Memory Total", "SmallData", 16384.0),
        namespace_sensor("/lpc/nct6798d/0", "Fan #2", "Fan", 980.0),
    ];
    let readings: Vec<_> = sensors
        .iter()
        .enumerate()
        .filter_map(|(i, s)| to_raw_reading(i, s))
        .collect();
    let classified = classify(&readings, &NAMESPACE_RULES);

    assert_eq!(classified.get(Category::CpuTemp), Some(71.3));
    assert_eq!(classified.get(Category::CpuClock), Some(4525.0));
    assert_eq!(classified.get(Category::GpuTemp), Some(64.0));
    assert_eq!(classified.get(Category::GpuClock), Some(2480.0));
    assert_eq!(classified.get(Category::GpuUsage), Some(88.0));
    assert_eq!(classified.get(Category::GpuFan), Some(1400.0));
    assert_eq!(classified.get(Category::GpuPower), Some(245.0));
    assert_eq!(classified.get(Category::GpuMemUsed), Some(4.0));
    assert_eq!(classified.get(Category::GpuMemTotal), Some(16.0));
    assert_eq!(classified.get(Category::CpuFan), Some(980.0));
}

#[test]
fn test_valueless_namespace_sensor_is_skipped() {
    let sensor = NamespaceSensor {
        name: "GPU Core".to_string(),
        sensor_type: "Load".to_string(),
        value: None,
        parent: "/gpu-nvidia/0".to_string(),
    };
    assert!(to_raw_reading(0, &sensor).is_none());
}

#[test]
fn test_temperature_bounds_are_exclusive() {
    for value in [0.0, 150.0, -20.0, 200.0, f64::NAN] {
        let readings = vec![raw("CPU", "CPU Package", SensorKind::Temperature, value)];
        assert!(
            !classify(&readings, &SHARED_MEMORY_RULES).contains(Category::CpuTemp),
            "{} accepted",
            value
        );
    }
    let readings = vec![raw("CPU", "CPU Package", SensorKind::Temperature, 0.5)];
    assert_eq!(
        classify(&readings, &SHARED_MEMORY_RULES).get(Category::CpuTemp),
        Some(0.5)
    );
}
