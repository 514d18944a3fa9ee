use anyhow::Result;
use colored::*;

use crate::core::config::MonitorConfig;
use crate::core::telemetry::TelemetryEngine;
use crate::ui::format_status;

/// Probe every backend once and report which ones came up.
pub fn execute(config: &MonitorConfig, json: bool) -> Result<()> {
    let mut engine = TelemetryEngine::detect(config);
    let status = engine.get_status();
    let names = engine.device_names().clone();
    engine.shutdown();

    if json {
        let report = serde_json::json!({
            "backends": status,
            "cpu_name": names.cpu,
            "gpu_name": names.gpu,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Telemetry backends".bold());
    println!("{}", format_status(&status));
    println!();
    println!("  {:<10} {}", "cpu".bold(), names.cpu.as_deref().unwrap_or("unknown"));
    println!("  {:<10} {}", "gpu".bold(), names.gpu.as_deref().unwrap_or("unknown"));
    Ok(())
}
