//! OS management (WMI) access for the instrumentation feed.
//!
//! Only compiled to something useful on Windows; elsewhere every entry
//! point reports the backend as unavailable.

use crate::core::telemetry::feed::{FeedError, FeedResult};
use crate::core::telemetry::instrumentation::{ManagementQueries, SensorNamespace};

#[cfg(windows)]
pub use windows_impl::{WmiManagement, WmiSensorNamespace};

/// Connect to the default management namespace.
#[cfg(windows)]
pub fn connect_management() -> FeedResult<Box<dyn ManagementQueries>> {
    Ok(Box::new(WmiManagement::connect()?))
}

#[cfg(not(windows))]
pub fn connect_management() -> FeedResult<Box<dyn ManagementQueries>> {
    Err(FeedError::unavailable("WMI is only available on Windows"))
}

#[cfg(windows)]
pub fn open_namespace(path: &str) -> FeedResult<Box<dyn SensorNamespace>> {
    Ok(Box::new(WmiSensorNamespace::open(path)?))
}

#[cfg(not(windows))]
pub fn open_namespace(path: &str) -> FeedResult<Box<dyn SensorNamespace>> {
    Err(FeedError::unavailable(format!(
        "sensor namespace {} is only available on Windows",
        path
    )))
}

#[cfg(windows)]
mod windows_impl {
    use std::collections::HashMap;

    use serde::Deserialize;
    use wmi::{Variant, WMIConnection};

    use super::{FeedError, FeedResult, ManagementQueries, SensorNamespace};
    use crate::core::telemetry::instrumentation::NamespaceSensor;

    const ACPI_NAMESPACE: &str = "root\\wmi";

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "PascalCase")]
    struct NamedObject {
        name: Option<String>,
    }

    fn variant_f64(v: &Variant) -> Option<f64> {
        match v {
            Variant::UI8(n) => Some(*n as f64),
            Variant::UI4(n) => Some(*n as f64),
            Variant::UI2(n) => Some(*n as f64),
            Variant::UI1(n) => Some(*n as f64),
            Variant::I4(n) => Some(*n as f64),
            Variant::I8(n) => Some(*n as f64),
            Variant::R8(n) => Some(*n),
            Variant::R4(n) => Some(*n as f64),
            Variant::String(s) => s.parse::<f64>().ok(),
            _ => None,
        }
    }

    fn variant_string(v: Option<&Variant>) -> String {
        match v {
            Some(Variant::String(s)) => s.clone(),
            _ => String::new(),
        }
    }

    fn query_failed(what: &str, e: wmi::WMIError) -> FeedError {
        FeedError::transient(format!("{} query failed: {}", what, e))
    }

    pub struct WmiManagement {
        cimv2: WMIConnection,
        /// Thermal zones live in a separate namespace that may be locked down
        acpi: Option<WMIConnection>,
    }

    impl WmiManagement {
        pub fn connect() -> FeedResult<Self> {
            let cimv2 = WMIConnection::new()
                .map_err(|e| FeedError::unavailable(format!("Failed to connect to WMI: {}", e)))?;
            let acpi = WMIConnection::with_namespace_path(ACPI_NAMESPACE)
                .inspect_err(|e| log::debug!("{} unavailable: {}", ACPI_NAMESPACE, e))
                .ok();
            log::info!("Connected to WMI");
            Ok(Self { cimv2, acpi })
        }

        fn names(&self, class: &str) -> FeedResult<Vec<String>> {
            let rows: Vec<NamedObject> = self
                .cimv2
                .raw_query(format!("SELECT Name FROM {}", class))
                .map_err(|e| query_failed(class, e))?;
            Ok(rows.into_iter().filter_map(|row| row.name).collect())
        }
    }

    impl ManagementQueries for WmiManagement {
        fn thermal_zones(&self) -> FeedResult<Vec<f64>> {
            let acpi = self
                .acpi
                .as_ref()
                .ok_or_else(|| FeedError::unavailable("ACPI namespace not connected"))?;
            let rows: Vec<HashMap<String, Variant>> = acpi
                .raw_query("SELECT CurrentTemperature FROM MSAcpi_ThermalZoneTemperature")
                .map_err(|e| query_failed("MSAcpi_ThermalZoneTemperature", e))?;
            Ok(rows
                .iter()
                .filter_map(|row| row.get("CurrentTemperature").and_then(variant_f64))
                .collect())
        }

        fn processor_names(&self) -> FeedResult<Vec<String>> {
            self.names("Win32_Processor")
        }

        fn video_controller_names(&self) -> FeedResult<Vec<String>> {
            self.names("Win32_VideoController")
        }
    }

    pub struct WmiSensorNamespace {
        path: String,
        connection: WMIConnection,
    }

    impl WmiSensorNamespace {
        pub fn open(path: &str) -> FeedResult<Self> {
            let connection = WMIConnection::with_namespace_path(path)
                .map_err(|e| FeedError::unavailable(format!("{}: {}", path, e)))?;
            Ok(Self {
                path: path.to_string(),
                connection,
            })
        }
    }

    impl SensorNamespace for WmiSensorNamespace {
        fn path(&self) -> &str {
            &self.path
        }

        fn query_sensors(&self) -> FeedResult<Vec<NamespaceSensor>> {
            let rows: Vec<HashMap<String, Variant>> = self
                .connection
                .raw_query("SELECT Name, SensorType, Value, Parent FROM Sensor")
                .map_err(|e| query_failed("Sensor", e))?;

            Ok(rows
                .iter()
                .map(|row| NamespaceSensor {
                    name: variant_string(row.get("Name")),
                    sensor_type: variant_string(row.get("SensorType")),
                    value: row.get("Value").and_then(variant_f64),
                    parent: variant_string(row.get("Parent")),
                })
                .collect())
        }
    }
}
