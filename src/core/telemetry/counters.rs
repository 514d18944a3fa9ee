use serde::{Deserialize, Serialize};
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Always-available OS counters (Tier D).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OsCounters {
    pub cpu_usage_percent: f32,
    pub ram_usage_percent: f32,
    pub ram_used_bytes: u64,
    pub ram_total_bytes: u64,
}

impl OsCounters {
    pub fn from_memory(cpu_usage_percent: f32, ram_used_bytes: u64, ram_total_bytes: u64) -> Self {
        Self {
            cpu_usage_percent,
            ram_usage_percent: if ram_total_bytes > 0 {
                (ram_used_bytes as f32 / ram_total_bytes as f32) * 100.0
            } else {
                0.0
            },
            ram_used_bytes,
            ram_total_bytes,
        }
    }
}

pub fn bytes_to_gib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GIB
}

pub trait CounterSource {
    fn sample(&mut self) -> OsCounters;

    /// Processor model, when the OS knows it
    fn cpu_brand(&self) -> Option<String> {
        None
    }
}

pub struct SysinfoCounters {
    system: System,
}

impl SysinfoCounters {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
            .with_memory(MemoryRefreshKind::nothing().with_ram());

        Self {
            system: System::new_with_specifics(refresh_kind),
        }
    }
}

impl Default for SysinfoCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for SysinfoCounters {
    fn sample(&mut self) -> OsCounters {
        // Usage is a delta against the previous refresh.
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        OsCounters::from_memory(
            self.system.global_cpu_usage(),
            self.system.used_memory(),
            self.system.total_memory(),
        )
    }

    fn cpu_brand(&self) -> Option<String> {
        self.system
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
    }
}
