use anyhow::Result;
use colored::*;

use crate::core::config::MonitorConfig;
use crate::core::telemetry::TelemetryEngine;
use crate::ui::format_sensor_table;

/// Dump every raw reading the sensor backends currently export.
pub fn execute(config: &MonitorConfig, json: bool) -> Result<()> {
    let mut engine = TelemetryEngine::detect(config);
    let readings = engine.list_sensors();
    engine.shutdown();

    if json {
        println!("{}", serde_json::to_string_pretty(&readings)?);
        return Ok(());
    }

    if readings.is_empty() {
        println!("{}", "No raw sensor readings available.".yellow());
        println!(
            "{}",
            "Start HWiNFO with shared memory enabled, or LibreHardwareMonitor with its WMI provider."
                .dimmed()
        );
        return Ok(());
    }

    print!("{}", format_sensor_table(&readings));
    println!("{}", format!("{} readings", readings.len()).dimmed());
    Ok(())
}
