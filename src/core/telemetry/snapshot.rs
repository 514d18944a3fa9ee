use serde::{Deserialize, Serialize};

use super::counters::{bytes_to_gib, OsCounters};
use super::feed::DeviceNames;
use super::reading::{Category, ClassifiedReadings};

/// One poll's view of the machine. Absent fields mean no backend produced
/// a sane value for them this poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unix seconds
    pub timestamp: i64,

    pub cpu_name: Option<String>,
    pub cpu_temp: Option<f64>,
    pub cpu_clock: Option<f64>,
    pub cpu_fan_rpm: Option<u32>,
    pub cpu_usage_percent: f32,

    pub gpu_name: Option<String>,
    pub gpu_temp: Option<f64>,
    pub gpu_clock: Option<f64>,
    pub gpu_usage: Option<f64>,
    pub gpu_power: Option<f64>,
    pub gpu_memory_used_gb: Option<f64>,
    pub gpu_memory_total_gb: Option<f64>,
    pub gpu_fan_rpm: Option<u32>,
    pub gpu_fan_percent: Option<f64>,

    pub fps: Option<f64>,

    pub ram_usage_percent: f32,
    pub ram_used_bytes: u64,
    pub ram_total_bytes: u64,
}

fn rpm(value: Option<f64>) -> Option<u32> {
    value.map(|v| v.round() as u32)
}

impl Snapshot {
    pub fn assemble(fields: &ClassifiedReadings, counters: OsCounters, names: DeviceNames) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp(),
            cpu_name: names.cpu,
            cpu_temp: fields.get(Category::CpuTemp),
            cpu_clock: fields.get(Category::CpuClock),
            cpu_fan_rpm: rpm(fields.get(Category::CpuFan)),
            cpu_usage_percent: counters.cpu_usage_percent,
            gpu_name: names.gpu,
            gpu_temp: fields.get(Category::GpuTemp),
            gpu_clock: fields.get(Category::GpuClock),
            gpu_usage: fields.get(Category::GpuUsage),
            gpu_power: fields.get(Category::GpuPower),
            gpu_memory_used_gb: fields.get(Category::GpuMemUsed),
            gpu_memory_total_gb: fields.get(Category::GpuMemTotal),
            gpu_fan_rpm: rpm(fields.get(Category::GpuFan)),
            gpu_fan_percent: fields.get(Category::GpuFanPercent),
            fps: fields.get(Category::Fps),
            ram_usage_percent: counters.ram_usage_percent,
            ram_used_bytes: counters.ram_used_bytes,
            ram_total_bytes: counters.ram_total_bytes,
        }
    }

    /// Value of a classified field, fans as whole RPM.
    pub fn get(&self, category: Category) -> Option<f64> {
        match category {
            Category::CpuTemp => self.cpu_temp,
            Category::CpuClock => self.cpu_clock,
            Category::CpuFan => self.cpu_fan_rpm.map(f64::from),
            Category::GpuTemp => self.gpu_temp,
            Category::GpuClock => self.gpu_clock,
            Category::GpuFan => self.gpu_fan_rpm.map(f64::from),
            Category::GpuFanPercent => self.gpu_fan_percent,
            Category::GpuUsage => self.gpu_usage,
            Category::GpuPower => self.gpu_power,
            Category::GpuMemUsed => self.gpu_memory_used_gb,
            Category::GpuMemTotal => self.gpu_memory_total_gb,
            Category::Fps => self.fps,
        }
    }

    pub fn ram_used_gb(&self) -> f64 {
        bytes_to_gib(self.ram_used_bytes)
    }

    pub fn ram_total_gb(&self) -> f64 {
        bytes_to_gib(self.ram_total_bytes)
    }

    pub fn has_gpu_data(&self) -> bool {
        [
            Category::GpuTemp,
            Category::GpuClock,
            Category::GpuUsage,
            Category::GpuPower,
            Category::GpuMemUsed,
        ]
        .into_iter()
        .any(|c| self.get(c).is_some())
    }
}
