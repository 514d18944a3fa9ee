use chrono::{DateTime, Local, Utc};
use colored::*;

use crate::core::telemetry::{BackendStatus, Snapshot, SourcedReading};

/// Shown for fields no backend could provide
pub const PLACEHOLDER: &str = "N/A";

/// Format an optional value with a fixed number of decimals and a unit.
pub fn format_optional(value: Option<f64>, decimals: usize, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.*}{}", decimals, v, unit),
        None => PLACEHOLDER.to_string(),
    }
}

/// Format byte counts as GB with one decimal
pub fn format_gb(bytes: u64) -> String {
    format!("{:.1}GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
}

/// Format a Unix timestamp as local time (HH:MM:SS)
pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|utc| utc.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Colour a temperature by how hot it is.
fn colored_temp(value: Option<f64>) -> ColoredString {
    let text = format_optional(value, 0, "°C");
    match value {
        Some(t) if t >= 85.0 => text.red().bold(),
        Some(t) if t >= 70.0 => text.yellow(),
        Some(_) => text.green(),
        None => text.dimmed(),
    }
}

fn gpu_memory(snapshot: &Snapshot) -> String {
    match (snapshot.gpu_memory_used_gb, snapshot.gpu_memory_total_gb) {
        (Some(used), Some(total)) => format!("{:.1}/{:.1}GB", used, total),
        (Some(used), None) => format!("{:.1}GB", used),
        _ => PLACEHOLDER.to_string(),
    }
}

fn gpu_fan(snapshot: &Snapshot) -> String {
    match (snapshot.gpu_fan_rpm, snapshot.gpu_fan_percent) {
        (Some(rpm), Some(pct)) => format!("{}RPM ({:.0}%)", rpm, pct),
        (Some(rpm), None) => format!("{}RPM", rpm),
        (None, Some(pct)) => format!("{:.0}%", pct),
        (None, None) => PLACEHOLDER.to_string(),
    }
}

/// Multi-line, coloured rendering of one snapshot.
pub fn format_snapshot(snapshot: &Snapshot) -> String {
    let cpu_name = snapshot.cpu_name.as_deref().unwrap_or("CPU");
    let gpu_name = snapshot.gpu_name.as_deref().unwrap_or("GPU");

    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        format_timestamp(snapshot.timestamp).dimmed(),
        format!("FPS {}", format_optional(snapshot.fps, 0, "")).bold()
    ));
    lines.push(format!(
        "  {:<5} {}  {:>5.1}%  {}  fan {}   {}",
        "CPU".cyan().bold(),
        colored_temp(snapshot.cpu_temp),
        snapshot.cpu_usage_percent,
        format_optional(snapshot.cpu_clock, 0, "MHz"),
        snapshot
            .cpu_fan_rpm
            .map(|rpm| format!("{}RPM", rpm))
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        cpu_name.dimmed()
    ));
    // Machines without a detected GPU get no GPU row at all.
    if snapshot.has_gpu_data() || snapshot.gpu_name.is_some() {
        lines.push(format!(
            "  {:<5} {}  {}  {}  {}  mem {}  fan {}   {}",
            "GPU".magenta().bold(),
            colored_temp(snapshot.gpu_temp),
            format_optional(snapshot.gpu_usage, 0, "%"),
            format_optional(snapshot.gpu_clock, 0, "MHz"),
            format_optional(snapshot.gpu_power, 1, "W"),
            gpu_memory(snapshot),
            gpu_fan(snapshot),
            gpu_name.dimmed()
        ));
    }
    lines.push(format!(
        "  {:<5} {:.1}%  {}/{}",
        "RAM".blue().bold(),
        snapshot.ram_usage_percent,
        format_gb(snapshot.ram_used_bytes),
        format_gb(snapshot.ram_total_bytes)
    ));
    lines.join("\n")
}

/// One line per backend with its availability.
pub fn format_status(status: &BackendStatus) -> String {
    status
        .iter()
        .map(|(name, up)| {
            let state = if up {
                "available".green()
            } else {
                "unavailable".red()
            };
            format!("  {:<10} {}", name.bold(), state)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Table of raw sensor readings.
pub fn format_sensor_table(readings: &[SourcedReading]) -> String {
    let mut out = format!(
        "{:<15} {:<40} {:<32} {:>12} {:<6} {}\n",
        "BACKEND", "DEVICE", "LABEL", "VALUE", "UNIT", "KIND"
    )
    .bold()
    .to_string();
    for sourced in readings {
        let r = &sourced.reading;
        out.push_str(&format!(
            "{:<15} {:<40} {:<32} {:>12.2} {:<6} {:?}\n",
            sourced.backend,
            truncate(&r.name, 40),
            truncate(&r.label, 32),
            r.value,
            r.unit,
            r.kind
        ));
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
