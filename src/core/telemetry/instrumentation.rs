//! Secondary instrumentation backend (Tier A).
//!
//! Reads the `Sensor` collection a hardware-monitoring service publishes
//! into an OS management namespace, plus the OS's own thermal zones as a
//! last resort for the CPU temperature.

use crate::core::telemetry::classifier::{classify, is_sane};
use crate::core::telemetry::feed::{
    BackendStatus, DeviceNames, FeedError, FeedResult, TelemetryFeed, BACKEND_OHM_LHM, BACKEND_WMI,
};
use crate::core::telemetry::reading::{Category, ClassifiedReadings, RawSensorReading, SensorKind};
use crate::core::telemetry::rules::NAMESPACE_RULES;

/// `SensorType` whose values are memory amounts in MB
const SMALL_DATA: &str = "SmallData";

/// Discrete adapter markers, preferred over integrated graphics.
const DISCRETE_GPU_MARKERS: [&str; 3] = ["Radeon RX", "GeForce", "Arc"];

/// One object of the namespace's `Sensor` collection.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceSensor {
    pub name: String,
    pub sensor_type: String,
    pub value: Option<f64>,
    /// Hardware identifier of the owning device, e.g. `/amdcpu/0`
    pub parent: String,
}

/// A hardware-monitoring namespace exposing a `Sensor` collection.
pub trait SensorNamespace {
    fn path(&self) -> &str;
    fn query_sensors(&self) -> FeedResult<Vec<NamespaceSensor>>;
}

/// Queries against the OS's built-in management classes.
pub trait ManagementQueries {
    /// ACPI thermal zone readings, in tenths of Kelvin
    fn thermal_zones(&self) -> FeedResult<Vec<f64>>;
    fn processor_names(&self) -> FeedResult<Vec<String>>;
    fn video_controller_names(&self) -> FeedResult<Vec<String>>;
}

/// Adopt the first candidate namespace that exists and has sensors.
pub fn probe_namespaces<F>(candidates: &[String], mut open: F) -> Option<Box<dyn SensorNamespace>>
where
    F: FnMut(&str) -> FeedResult<Box<dyn SensorNamespace>>,
{
    for path in candidates {
        match open(path).and_then(|ns| ns.query_sensors().map(|sensors| (ns, sensors))) {
            Ok((ns, sensors)) if !sensors.is_empty() => {
                log::info!("Using sensor namespace {} ({} sensors)", path, sensors.len());
                return Some(ns);
            }
            Ok(_) => log::debug!("Sensor namespace {} is empty", path),
            Err(e) => log::debug!("Sensor namespace {} unavailable: {}", path, e),
        }
    }
    None
}

pub struct InstrumentationFeed {
    management: Option<Box<dyn ManagementQueries>>,
    namespace: Option<Box<dyn SensorNamespace>>,
    names: DeviceNames,
}

impl InstrumentationFeed {
    /// Without a management connection the whole tier is down; the sensor
    /// namespace alone is never consulted.
    pub fn new(
        management: Option<Box<dyn ManagementQueries>>,
        namespace: Option<Box<dyn SensorNamespace>>,
    ) -> Self {
        let names = management
            .as_deref()
            .map(|management| query_device_names(management))
            .unwrap_or_default();
        let namespace = if management.is_some() { namespace } else { None };
        if let Some(ns) = &namespace {
            log::info!("Instrumentation tier reading {}", ns.path());
        }
        Self {
            management,
            namespace,
            names,
        }
    }

    fn management(&self) -> FeedResult<&dyn ManagementQueries> {
        self.management
            .as_deref()
            .ok_or_else(|| FeedError::unavailable("management connection not established"))
    }

    fn namespace_readings(&self) -> FeedResult<Vec<RawSensorReading>> {
        self.management()?;
        let Some(namespace) = self.namespace.as_deref() else {
            return Ok(Vec::new());
        };
        let sensors = namespace
            .query_sensors()
            .inspect_err(|e| log::debug!("{} query failed: {}", namespace.path(), e))?;
        Ok(sensors
            .iter()
            .enumerate()
            .filter_map(|(index, sensor)| to_raw_reading(index, sensor))
            .collect())
    }

    fn thermal_zone_cpu_temp(management: &dyn ManagementQueries) -> Option<f64> {
        let zones = management
            .thermal_zones()
            .inspect_err(|e| log::debug!("Thermal zone query failed: {}", e))
            .ok()?;
        let celsius = tenths_kelvin_to_celsius(*zones.first()?);
        is_sane(Category::CpuTemp, celsius).then_some(celsius)
    }
}

impl TelemetryFeed for InstrumentationFeed {
    fn name(&self) -> &'static str {
        "instrumentation"
    }

    fn record_status(&self, status: &mut BackendStatus) {
        status.record(BACKEND_WMI, self.management.is_some());
        status.record(BACKEND_OHM_LHM, self.namespace.is_some());
    }

    fn read(&mut self) -> FeedResult<ClassifiedReadings> {
        let management = self.management()?;

        let mut classified = match self.namespace_readings() {
            Ok(readings) => classify(&readings, &NAMESPACE_RULES),
            Err(e) => {
                log::debug!("Sensor namespace query failed: {}", e);
                ClassifiedReadings::new()
            }
        };

        if !classified.contains(Category::CpuTemp) {
            if let Some(temp) = Self::thermal_zone_cpu_temp(management) {
                classified.set(Category::CpuTemp, temp);
            }
        }
        Ok(classified)
    }

    fn device_names(&self) -> DeviceNames {
        self.names.clone()
    }

    fn raw_readings(&mut self) -> FeedResult<Vec<RawSensorReading>> {
        self.namespace_readings()
    }

    fn shutdown(&mut self) {
        self.namespace = None;
        self.management = None;
    }
}

/// Namespace objects map onto raw readings with the owning device as the
/// name. Objects without a value are dropped.
pub fn to_raw_reading(index: usize, sensor: &NamespaceSensor) -> Option<RawSensorReading> {
    let value = sensor.value?;
    let unit = if sensor.sensor_type == SMALL_DATA { "MB" } else { "" };
    Some(RawSensorReading {
        id: index as u32,
        name: sensor.parent.clone(),
        label: sensor.name.clone(),
        unit: unit.to_string(),
        value,
        kind: SensorKind::from_namespace_type(&sensor.sensor_type),
    })
}

pub fn tenths_kelvin_to_celsius(tenths: f64) -> f64 {
    tenths / 10.0 - 273.15
}

/// First listed adapter unless a discrete one is present.
pub fn pick_gpu_name(names: &[String]) -> Option<String> {
    names
        .iter()
        .find(|name| DISCRETE_GPU_MARKERS.iter().any(|m| name.contains(m)))
        .or_else(|| names.first())
        .map(|name| name.trim().to_string())
}

fn query_device_names(management: &dyn ManagementQueries) -> DeviceNames {
    let cpu = management
        .processor_names()
        .inspect_err(|e| log::debug!("Processor name query failed: {}", e))
        .ok()
        .and_then(|names| names.into_iter().map(|n| n.trim().to_string()).find(|n| !n.is_empty()));
    let gpu = management
        .video_controller_names()
        .inspect_err(|e| log::debug!("Video controller query failed: {}", e))
        .ok()
        .and_then(|names| pick_gpu_name(&names));
    DeviceNames { cpu, gpu }
}
